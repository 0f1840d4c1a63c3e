use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;
use log::{info, warn};

use clrhost::clr::{ICorRuntimeHost, MetaHost};
use clrhost::guid::CLSID_COR_RUNTIME_HOST;
use clrhost::native::{Mscoree, OleAutomation};
use clrhost::safearray::SafeArray;
use clrhost::{ClrError, ClrResult};

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Runs a .NET Framework executable from memory", long_about = None)]
struct Cli {
    /// The managed executable to load
    assembly: PathBuf,

    /// Arguments passed on to the entry point
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    /// The CLR version to bind
    #[arg(long, default_value = "v4.0.30319")]
    runtime_version: String,

    /// Run inside this application domain, creating it if necessary
    #[arg(long)]
    domain: Option<String>,
}

fn run(cli: &Cli) -> ClrResult<i32> {
    let image = fs::read(&cli.assembly)?;
    info!("read {} bytes from {}", image.len(), cli.assembly.display());

    let mscoree = Mscoree::load()?;
    let ole = OleAutomation::load()?;

    let meta_host = MetaHost::create(&mscoree)?;
    let runtime_info = meta_host.runtime(&cli.runtime_version)?;
    if !runtime_info.is_loadable()? {
        return Err(ClrError::NotFound(format!("a loadable runtime {}", cli.runtime_version)));
    }
    runtime_info.bind_as_legacy_runtime()?;
    info!("bound runtime {}", runtime_info.version_string()?);

    let runtime_host = runtime_info.get_interface::<ICorRuntimeHost>(&CLSID_COR_RUNTIME_HOST)?;
    runtime_host.start()?;

    let domain = match &cli.domain {
        Some(name) => runtime_host.find_or_create_domain(&ole, name)?,
        None => runtime_host.default_domain()?,
    };
    info!("using domain {}", domain.friendly_name(&ole)?);

    let raw_assembly = SafeArray::from_bytes(&ole, &image)?;
    let assembly = domain.load_from_bytes(&raw_assembly)?;
    drop(raw_assembly);

    let entry_point = assembly
        .entry_point()?
        .ok_or_else(|| ClrError::NotFound(format!("an entry point in {}", cli.assembly.display())))?;
    info!("invoking {}", entry_point.signature(&ole)?);

    if entry_point.takes_arguments(&ole)? {
        let params = SafeArray::entry_point_arguments(&ole, &cli.args)?;
        entry_point.invoke(&ole, None, Some(&params))
    } else {
        if !cli.args.is_empty() {
            warn!("entry point takes no arguments, ignoring {}", cli.args.len());
        }
        entry_point.invoke(&ole, None, None)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => {
            info!("entry point returned {}", code);
            process::exit(code);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
