/// Example program to print the loaded configuration
///
/// Run with: cargo run -p glossa-config --example print_config
use glossa_config::{DataDirAddons, GlossaConfig};

fn main() {
    // Load configuration from glossa.toml
    let config = GlossaConfig::load();

    println!("=== Glossa Configuration ===\n");

    println!("Language Settings:");
    println!("  Name: {}", config.language.name);
    println!("  Data Root: {:?}", config.language.data_root);
    println!();

    println!("Display Settings:");
    println!("  Size: {}x{}", config.display.width, config.display.height);
    println!();

    println!("Text Overrides:");
    println!("  Font Size Method: {:?}", config.text.font_size_method);
    println!("  Font Adjustment: {:?}", config.text.font_adjustment);
    println!();

    println!("Diagnostics Settings:");
    println!("  Enabled: {}", config.diagnostics.enabled);
    println!("  Dump Dir: {:?}", config.diagnostics.resolved_dump_dir());
    println!("  Keep Count: {}", config.diagnostics.keep_count);
    println!("  Extended Info: {}", config.diagnostics.extended_info);
    println!();

    match config.load_language(&DataDirAddons::new(&config.language.data_root)) {
        Ok(language) => match toml::to_string_pretty(&language) {
            Ok(toml_str) => {
                println!("=== Language Definition ===");
                println!("{}", toml_str);
            }
            Err(e) => eprintln!("Failed to serialize language definition: {}", e),
        },
        Err(e) => eprintln!("Failed to load language: {}", e),
    }
}
