use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser};
use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crossclip::clipboard::{Clipboard, ClipboardEvent, ClipboardWatcher};
use crossclip::image::Image;
use crossclip::platform::BackendKind;
use crossclip::storage::{self, Config, ConfigStorage};

#[derive(Parser)]
#[command(name = "crossclip")]
#[command(about = "Copy to and paste from the system clipboard", long_about = None)]
#[command(group(ArgGroup::new("transfer").args(["copy", "paste"])))]
struct Cli {
    /// Copy TEXT to the clipboard (reads stdin when TEXT is omitted)
    #[arg(short, long, conflicts_with = "paste")]
    copy: bool,

    /// Print the clipboard text
    #[arg(short, long)]
    paste: bool,

    /// With --copy, copy this image file; with --paste, save the clipboard image here
    #[arg(long, value_name = "FILE", requires = "transfer")]
    image: Option<PathBuf>,

    /// Use this backend instead of detecting one
    #[arg(long, value_name = "gtk|qt|appkit|win32")]
    backend: Option<BackendKind>,

    /// Print the selected backend and its native image type
    #[arg(long)]
    info: bool,

    /// Print clipboard changes until interrupted
    #[arg(long, conflicts_with_all = ["copy", "paste"])]
    watch: bool,

    /// Text to copy
    text: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !(cli.copy || cli.paste || cli.info || cli.watch) {
        eprintln!("crossclip: nothing to do, pass --copy, --paste, --info or --watch");
        return ExitCode::from(1);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("crossclip: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // The log level lives in the config, so records emitted while loading it
    // are lost; problems there are reported on stderr instead
    let config = load_config();
    init_logging(&config)?;
    log::debug!("Configuration: {:?}", config);

    let mut clipboard = open_clipboard(cli.backend.or(config.general.backend))?;

    if cli.info {
        cmd_info(&clipboard);
    }
    if cli.copy {
        match &cli.image {
            Some(path) => cmd_copy_image(&mut clipboard, path)?,
            None => cmd_copy_text(&mut clipboard, cli.text)?,
        }
    }
    if cli.paste {
        match &cli.image {
            Some(path) => cmd_paste_image(&mut clipboard, path)?,
            None => cmd_paste_text(&mut clipboard)?,
        }
    }
    if cli.watch {
        cmd_watch(&mut clipboard, &config)?;
    }

    Ok(())
}

/// Load the config file, falling back to defaults when it cannot be read
fn load_config() -> Config {
    let loaded = storage::default_config_storage().and_then(|storage| storage.load());
    match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("crossclip: ignoring configuration: {:#}", e);
            Config::default()
        }
    }
}

fn init_logging(config: &Config) -> Result<()> {
    match &config.general.log_file {
        Some(path) => crossclip::logging::init_logger(path, &config.general.log_level),
        None => {
            env_logger::Builder::new()
                .filter_level(crossclip::logging::parse_level(&config.general.log_level))
                .parse_default_env()
                .init();
            Ok(())
        }
    }
}

fn open_clipboard(backend: Option<BackendKind>) -> Result<Clipboard> {
    let clipboard = match backend {
        Some(kind) => {
            log::info!("Using configured {} backend", kind);
            Clipboard::with_kind(kind)
        }
        None => Clipboard::new(),
    };
    clipboard.context("Failed to open the clipboard")
}

fn cmd_info(clipboard: &Clipboard) {
    println!("Backend: {}", clipboard.kind());
    println!("Native format: {}", clipboard.native_format());
    println!("Native type: {}", clipboard.native_type());
    println!("Alpha channel: {}", if clipboard.supports_alpha() { "kept" } else { "dropped" });
}

fn cmd_copy_text(clipboard: &mut Clipboard, text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
    };

    clipboard.set_text(&text)?;
    log::info!("Copied {} bytes of text", text.len());
    Ok(())
}

fn cmd_paste_text(clipboard: &mut Clipboard) -> Result<()> {
    // An empty clipboard prints nothing
    if let Some(text) = clipboard.get_text()? {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}

fn cmd_copy_image(clipboard: &mut Clipboard, path: &Path) -> Result<()> {
    let image = ::image::open(path).with_context(|| format!("Failed to read image {:?}", path))?;
    let image = crossclip::image::normalize(&image);
    log::info!("Copying {}x{} image from {:?}", image.width(), image.height(), path);
    clipboard.set_image(Image::Generic(image), false)?;
    Ok(())
}

fn cmd_paste_image(clipboard: &mut Clipboard, path: &Path) -> Result<()> {
    let Some(image) = clipboard.get_image(false)?.and_then(Image::into_generic) else {
        log::info!("Clipboard holds no image");
        return Ok(());
    };
    image
        .save(path)
        .with_context(|| format!("Failed to write image {:?}", path))?;
    log::info!("Saved {}x{} image to {:?}", image.width(), image.height(), path);
    Ok(())
}

fn cmd_watch(clipboard: &mut Clipboard, config: &Config) -> Result<()> {
    let mut watcher = ClipboardWatcher::new(config.watch.interval());
    let mut stdout = io::stdout();
    let mut failure = None;

    watcher.run(clipboard, |event| {
        let line = match event {
            ClipboardEvent::TextChanged(text) => format!("text: {}", text.escape_debug()),
            ClipboardEvent::ImageChanged(image) => {
                format!("image: {}x{}", image.width(), image.height())
            }
        };
        // Stop quietly once stdout is gone (e.g. piped into head)
        match writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        }
    })?;

    match failure {
        Some(e) if e.kind() != io::ErrorKind::BrokenPipe => bail!("Failed to write event: {}", e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_needs_copy_or_paste() {
        assert!(Cli::try_parse_from(["crossclip", "--info", "--image", "out.png"]).is_err());
        assert!(Cli::try_parse_from(["crossclip", "--image", "out.png"]).is_err());

        let cli = Cli::try_parse_from(["crossclip", "--paste", "--image", "out.png"]).unwrap();
        assert!(cli.paste);
        assert_eq!(cli.image, Some(PathBuf::from("out.png")));
        assert!(Cli::try_parse_from(["crossclip", "-c", "--image", "in.png"]).is_ok());
    }

    #[test]
    fn test_copy_and_paste_conflict() {
        assert!(Cli::try_parse_from(["crossclip", "-c", "-p"]).is_err());
        let cli = Cli::try_parse_from(["crossclip", "-c", "hello"]).unwrap();
        assert_eq!(cli.text.as_deref(), Some("hello"));
        assert_eq!(
            Cli::try_parse_from(["crossclip", "--info", "--backend", "qt"]).unwrap().backend,
            Some(BackendKind::Qt)
        );
    }
}
