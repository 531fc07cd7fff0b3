use clap::{Parser, Subcommand};
use hamcert::{
    BackgroundImage, CertConfig, CertError, FieldValues, Identity, ImageFormat, LegacyTemplate,
    TemplateDescriptor,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "hamcert", version, about = "Render event certificates from templates")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory fonts and background paths are resolved against.
    #[arg(long, global = true)]
    asset_root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template with explicit field values.
    Render {
        /// Template descriptor JSON.
        #[arg(long)]
        template: PathBuf,
        /// Field values JSON, e.g. {"call_sign": "N0CALL"}.
        #[arg(long)]
        values: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Render a template for a stored recipient record.
    Identity {
        #[arg(long)]
        template: PathBuf,
        /// Recipient record JSON.
        #[arg(long)]
        identity: PathBuf,
        /// Which contact entry supplies the frequency.
        #[arg(long, default_value_t = 0)]
        attribute: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Render one of the fixed legacy layouts.
    Legacy {
        /// classic or modern.
        #[arg(long)]
        layout: LegacyTemplate,
        /// Background image (PNG or JPEG).
        #[arg(long)]
        background: PathBuf,
        #[arg(long)]
        call_sign: String,
        #[arg(long)]
        name: String,
        /// "40 m" or "2 m"; anything else leaves the frequency blank.
        #[arg(long)]
        band: String,
        #[arg(long)]
        out: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<CertConfig, CertError> {
    let config = match &cli.config {
        Some(path) => CertConfig::from_file(path)?,
        None => CertConfig::default(),
    };
    let config = config.with_env_overrides();
    Ok(match &cli.asset_root {
        Some(root) => config.with_asset_root(root),
        None => config,
    })
}

fn read_template(path: &Path) -> Result<TemplateDescriptor, CertError> {
    let file = fs::File::open(path)?;
    Ok(TemplateDescriptor::from_reader(std::io::BufReader::new(file))?)
}

fn main() -> Result<(), CertError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("hamcert=info"))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let compositor = config.compositor();

    match cli.cmd {
        Command::Render { template, values, out } => {
            let descriptor = read_template(&template)?;
            let values: FieldValues = serde_json::from_str(&fs::read_to_string(&values)?)?;
            compositor.render_to_file(&descriptor, &values, &out)?;
            println!("Wrote {}", out.display());
        }
        Command::Identity { template, identity, attribute, out } => {
            let descriptor = read_template(&template)?;
            let identity = Identity::from_json(&fs::read_to_string(&identity)?)?;
            compositor.render_to_file(&descriptor, &identity.field_values(attribute), &out)?;
            println!("Wrote certificate for {} to {}", identity.call_sign, out.display());
        }
        Command::Legacy { layout, background, call_sign, name, band, out } => {
            let format = background
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(ImageFormat::from_file_name)
                .unwrap_or(ImageFormat::Png);
            let image = BackgroundImage::inline(format, fs::read(&background)?);
            let descriptor = layout.descriptor_for(image, band.parse().ok());
            let values = layout.values(&call_sign, &name, &band);
            compositor.render_to_file(&descriptor, &values, &out)?;
            println!("Wrote {} certificate to {}", layout.name(), out.display());
        }
    }
    Ok(())
}
