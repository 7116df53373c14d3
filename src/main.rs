//! Command-line interface for xsdform

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use xsdform::documents::Document;
#[cfg(feature = "cli")]
use xsdform::{FormBuilder, FormConfig, FormRequest, PlainEnvelope, SchemaModel, TypeHierarchyIndex};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsdform")]
#[command(author, version, about = "XForms generator for XML Schema", long_about = None)]
struct Cli {
    /// Log synthesis details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an XForms document for a global element of a schema
    Generate {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Local name of the root element
        #[arg(short, long)]
        root: String,

        /// Instance document to embed instead of the generated skeleton
        #[arg(short, long)]
        instance: Option<PathBuf>,

        /// Submission action URI
        #[arg(short, long)]
        action: Option<String>,

        /// Submission method
        #[arg(short, long)]
        method: Option<String>,

        /// Base URI written as xml:base
        #[arg(short, long)]
        base: Option<String>,

        /// JSON file with presentation options
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emit a bare envelope instead of an XHTML page
        #[arg(long)]
        plain: bool,

        /// Dump the synthesized form as JSON
        #[arg(short, long)]
        json: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, for each named type, the types that may substitute it
    Hierarchy {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            schema,
            root,
            instance,
            action,
            method,
            base,
            config,
            plain,
            json,
            output,
        } => cmd_generate(GenerateArgs {
            schema,
            root,
            instance,
            action,
            method,
            base,
            config,
            plain,
            json,
            output,
        }),
        Commands::Hierarchy { schema, json } => cmd_hierarchy(schema, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
struct GenerateArgs {
    schema: PathBuf,
    root: String,
    instance: Option<PathBuf>,
    action: Option<String>,
    method: Option<String>,
    base: Option<String>,
    config: Option<PathBuf>,
    plain: bool,
    json: bool,
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
fn cmd_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaModel::from_file(&args.schema)?;
    let config = match &args.config {
        Some(path) => FormConfig::from_file(path)?,
        None => FormConfig::default(),
    };

    let mut request =
        FormRequest::new(args.root).with_schema_uri(args.schema.display().to_string());
    if let Some(path) = &args.instance {
        let root = Document::from_file(path)?
            .into_root()
            .ok_or("instance document has no root element")?;
        request = request.with_instance(root);
    }
    if let Some(action) = args.action {
        request = request.with_action(action);
    }
    if let Some(method) = args.method {
        request = request.with_method(method);
    }
    if let Some(base) = args.base {
        request = request.with_base(base);
    }

    let mut builder = FormBuilder::new(&schema).with_config(config);
    if args.plain {
        builder = builder.with_strategy(Box::new(PlainEnvelope));
    }
    let form = builder.build_form(&request)?;
    for anomaly in &form.anomalies {
        eprintln!("Warning: {}", anomaly);
    }

    let text = if args.json {
        form.to_json_string()?
    } else {
        form.to_xml_string()?
    };
    match args.output {
        Some(path) => fs::write(&path, text)?,
        None => println!("{}", text),
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_hierarchy(schema_path: PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaModel::from_file(&schema_path)?;
    let index = TypeHierarchyIndex::build(&schema);
    let entries = index.named_entries(&schema);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("xsdform v{}", xsdform::VERSION);
    println!();
    println!("Type hierarchy ({} types):", entries.len());
    for (name, derived) in &entries {
        if derived.is_empty() {
            println!("  {}", name);
        } else {
            println!("  {} <- {}", name, derived.join(", "));
        }
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    std::process::exit(1);
}
