use anyhow::{Context, Result, anyhow, bail};
use glossa_config::{DataDirAddons, GlossaConfig};
use glossa_diag::{
    CrashDumper, DiagnosticCapture, DisabledCapture, DumpSettings, install_panic_hook,
};
use glossa_text::{DisplayMetrics, scale_factor};
use std::sync::Arc;

/// Parse `1920x1080`.
fn parse_display(arg: &str) -> Result<DisplayMetrics> {
    let (w, h) = arg
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {arg:?}"))?;
    let width = w.trim().parse::<u32>().context("invalid display width")?;
    let height = h.trim().parse::<u32>().context("invalid display height")?;
    if width == 0 || height == 0 {
        bail!("display size must be non-zero, got {width}x{height}");
    }
    Ok(DisplayMetrics::new(width, height))
}

fn init_crash_dumps(config: &GlossaConfig) -> Arc<dyn DiagnosticCapture> {
    if !config.diagnostics.enabled {
        return Arc::new(DisabledCapture);
    }
    let dumper = Arc::new(CrashDumper::new(DumpSettings {
        keep_count: config.diagnostics.keep_count,
        extended_info: config.diagnostics.extended_info,
    }));
    match dumper.initialize(config.diagnostics.resolved_dump_dir()) {
        Ok(_) => {
            install_panic_hook(dumper.clone());
            dumper
        }
        Err(err) => {
            log::warn!("crash reports disabled: {err}");
            Arc::new(DisabledCapture)
        }
    }
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let config = GlossaConfig::load();
    let dumper = init_crash_dumps(&config);

    let display = match std::env::args().nth(1) {
        Some(arg) => parse_display(&arg)?,
        None => config.display.metrics(),
    };

    let addons = DataDirAddons::new(&config.language.data_root);
    let language = config
        .load_language(&addons)
        .with_context(|| format!("failed to load language {:?}", config.language.name))?;
    let scaling = language.scaling_config();

    println!("language:  {}", config.language.name);
    println!("display:   {}x{}", display.width, display.height);
    println!(
        "scaling:   {} at {} (factor {:.3})",
        scaling.policy,
        scaling.adjustment_strength,
        scale_factor(&scaling, display)
    );
    println!("hard wrap: {}", language.use_hard_word_wrap);
    for path in language.local_font_paths(config.language_dir()) {
        println!("local font: {}", path.display());
    }
    println!();

    for (role, font) in language.fonts.iter() {
        let scaled = language.scaled_font(font, display);
        println!(
            "{role:<32} {:<24} {:>3} -> {:>3}{}",
            font.name,
            font.size,
            scaled.size,
            if font.bold { "  bold" } else { "" }
        );
    }

    log::debug!("crash dumper active: {}", dumper.is_initialized());
    dumper.shutdown();
    Ok(())
}
