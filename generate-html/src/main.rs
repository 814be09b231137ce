use std::path::PathBuf;

use clap::Parser;
use shared::{load_descriptors, read_domain_name};
use tracing::info;

mod page;
mod template;

use page::{generate_site, write_site, Templates};

#[derive(Parser, Debug)]
#[command(name = "generate-html")]
#[command(about = "Render one HTML form page per function descriptor, plus an index page")]
struct Args {
    /// Directory holding one JSON descriptor per function
    #[arg(long, default_value = "configs/lambdas")]
    configs: PathBuf,

    /// Directory holding main_template.html and index_template.html
    #[arg(long, default_value = "ui_templates")]
    templates: PathBuf,

    /// Directory the pages are written to
    #[arg(long, default_value = "ui_compiled")]
    output: PathBuf,

    /// File whose first line assigns the domain name
    #[arg(long, default_value = "configs/domainName.ts")]
    domain_file: PathBuf,

    /// Use this domain instead of reading --domain-file
    #[arg(long)]
    domain: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();

    let domain = match args.domain {
        Some(domain) => domain,
        None => read_domain_name(&args.domain_file)?,
    };
    let descriptors = load_descriptors(&args.configs)?;
    let templates = Templates::load(&args.templates)?;

    let site = generate_site(&descriptors, &templates, &domain)?;
    write_site(&site, &args.output)?;

    let functions: Vec<&str> = site.function_names().collect();
    info!(
        ?functions,
        domain = %domain,
        output = %args.output.display(),
        "site generated"
    );
    Ok(())
}
