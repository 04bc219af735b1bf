//! Binding description tool
//!
//! Parses a WGSL shader and prints, for every resource binding, its type,
//! resolved buffer layout, default value text and struct memory grid.

use serde::Serialize;
use std::env;
use std::fs;
use std::path::Path;
use std::process;
use tracing::Level;
use wgsl_values::{BufferSpec, CodecOptions, FieldBox, TypeDescriptor, ValueCodec, field_layout};
use wgsl_values_reflect::{Binding, BindingKind, Reflection};

/// Everything printed for a single binding
#[derive(Serialize)]
struct BindingReport {
    id: String,
    name: String,
    #[serde(rename = "type")]
    ty: String,
    kind: BindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<BufferSpec>,
    /// Default text, or the reason there is none
    default_text: Result<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldBox>,
}

impl BindingReport {
    fn new(binding: &Binding, reflection: &Reflection, codec: &ValueCodec) -> Self {
        let fields = match &binding.ty {
            TypeDescriptor::Struct(name) => reflection.structs.get(name).map(field_layout).unwrap_or_default(),
            _ => Vec::new(),
        };
        Self {
            id: binding.id(),
            name: binding.name.clone(),
            ty: binding.ty.to_string(),
            kind: binding.kind,
            spec: codec.resolve(&binding.ty, &reflection.structs).ok(),
            default_text: codec.default_text(&binding.ty, &reflection.structs),
            fields,
        }
    }

    fn print(&self) {
        println!("[{}] {}: {} ({:?})", self.id, self.name, self.ty, self.kind);
        if let Some(spec) = &self.spec {
            let lines = serde_json::to_string(&spec.lines).unwrap_or_default();
            let repeat = if spec.repeat { " (repeated)" } else { "" };
            println!("  layout: {lines}{repeat}, {} bytes", spec.byte_size());
        }
        match &self.default_text {
            Ok(text) => {
                println!("  default:");
                for line in text.lines() {
                    println!("    {line}");
                }
            }
            Err(message) => println!("  default: {message}"),
        }
        for field in &self.fields {
            println!(
                "  [{},{}]..[{},{}] {}: {}",
                field.start_row, field.start_column, field.end_row, field.end_column, field.name, field.description
            );
        }
        println!();
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let verbose = args.iter().skip(1).any(|arg| arg == "-v");
    let json = args.iter().skip(1).any(|arg| arg == "--json");
    let positional: Vec<&String> = args.iter().skip(1).filter(|arg| !arg.starts_with('-')).collect();

    if positional.is_empty() || positional.len() > 2 {
        eprintln!("Usage: {} [-v] [--json] <shader.wgsl> [options.yaml]", args[0]);
        eprintln!("Describes the buffer layout and default value of every binding in a WGSL shader");
        process::exit(1);
    }

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install log subscriber: {e}");
    }

    let shader_path = positional[0];
    if !Path::new(shader_path).exists() {
        eprintln!("Error: Shader file '{shader_path}' does not exist");
        process::exit(1);
    }

    let options = match positional.get(1) {
        Some(options_path) => match fs::read_to_string(options_path).map_err(|e| e.to_string()).and_then(|yaml| CodecOptions::from_yaml(&yaml).map_err(|e| e.to_string())) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Error loading options '{options_path}': {e}");
                process::exit(1);
            }
        },
        None => CodecOptions::default(),
    };
    tracing::debug!(?options, "codec options");

    let source = match fs::read_to_string(shader_path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading shader '{shader_path}': {e}");
            process::exit(1);
        }
    };

    let reflection = match Reflection::parse(&source) {
        Ok(reflection) => reflection,
        Err(e) => {
            eprintln!("Error in shader '{shader_path}': {e}");
            process::exit(1);
        }
    };

    let codec = ValueCodec::new(options);
    let reports: Vec<BindingReport> = reflection.bindings.iter().map(|binding| BindingReport::new(binding, &reflection, &codec)).collect();

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                process::exit(1);
            }
        }
    } else {
        for report in &reports {
            report.print();
        }
    }
}
