//! Templates command - inspect the templates extraction would use.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use docex_core::{TemplateLoader, TemplateStore};

use super::load_config;

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,

    /// Template folder (default: configured folder or built-in templates)
    #[arg(short, long, global = true)]
    templates: Option<PathBuf>,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List templates in match order
    List,

    /// Show one template
    Show {
        /// Issuer name of the template
        issuer: String,
    },
}

pub async fn run(args: TemplatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let folder = args.templates.or(config.extraction.template_folder);
    let templates = TemplateLoader::new().load(folder.as_deref())?;

    match args.command {
        TemplatesCommand::List => {
            for template in templates.iter() {
                println!(
                    "{:>3}  {}  {}",
                    template.priority(),
                    style(template.issuer()).bold(),
                    style(template.source()).dim()
                );
            }
            println!();
            println!("{} {} templates", style("ℹ").blue(), templates.len());
        }
        TemplatesCommand::Show { issuer } => {
            let Some(template) = templates.get(&issuer) else {
                anyhow::bail!("No template with issuer: {}", issuer);
            };

            let options = template.options();
            println!("Issuer:    {}", style(template.issuer()).bold());
            println!("Source:    {}", template.source());
            println!("Priority:  {}", template.priority());
            println!("Keywords:  {}", template.keywords().join(", "));
            println!("Fields:    {}", template.field_names().join(", "));
            println!("Required:  {}", template.required_fields().join(", "));
            println!("Currency:  {}", options.currency);
            println!("Decimal:   {:?}", options.decimal_separator);
            if !options.date_formats.is_empty() {
                println!("Dates:     {}", options.date_formats.join(", "));
            }
        }
    }

    Ok(())
}
