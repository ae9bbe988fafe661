//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use provisioner_lib::{CreatedWorkload, ResourceKind, WorkloadDescriptor};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

#[derive(Tabled)]
struct DescriptorRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl DescriptorRow {
    fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

fn descriptor_rows(descriptor: &WorkloadDescriptor) -> Vec<DescriptorRow> {
    let container = &descriptor.container;
    let labels = descriptor
        .selector
        .as_map()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");
    let ports = container
        .ports
        .iter()
        .map(|p| format!("{} {}/{}", p.name, p.container_port, p.protocol.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let bound = |kind: ResourceKind| {
        container
            .resource(kind)
            .map(|b| format!("{} / {}", b.request().0, b.limit().0))
            .unwrap_or_else(|| "-".to_string())
    };

    vec![
        DescriptorRow::new("Name prefix", descriptor.name_prefix.as_str()),
        DescriptorRow::new("Namespace", descriptor.namespace.as_str()),
        DescriptorRow::new("Replicas", descriptor.replicas.to_string()),
        DescriptorRow::new("Labels", labels),
        DescriptorRow::new("Container", container.name.as_str()),
        DescriptorRow::new("Image", container.image.as_str()),
        DescriptorRow::new("Ports", ports),
        DescriptorRow::new("CPU (request / limit)", bound(ResourceKind::Cpu)),
        DescriptorRow::new("Memory (request / limit)", bound(ResourceKind::Memory)),
    ]
}

/// Print a descriptor without submitting it
pub fn print_descriptor(descriptor: &WorkloadDescriptor, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let table = Table::new(descriptor_rows(descriptor))
                .with(Style::rounded())
                .to_string();
            println!("{}", table);
            print_info("Dry run: nothing was submitted");
        }
        OutputFormat::Json => print_json(&descriptor.to_deployment())?,
    }
    Ok(())
}

/// Print the result of a successful create
pub fn print_created(created: &CreatedWorkload, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_success(&format!(
            "Created deployment {}/{}",
            created.namespace,
            created.name.bold()
        )),
        OutputFormat::Json => print_json(created)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
