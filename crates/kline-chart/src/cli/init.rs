/*
[INPUT]:  Optional interactive answers (feed URL, event, title)
[OUTPUT]: YAML configuration file with every option spelled out
[POS]:    CLI initialization layer
[UPDATE]: When AppConfig schema changes
*/

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use console::style;
use dialoguer::{Input, theme::ColorfulTheme};

use kline_chart::AppConfig;

const FALLBACK_OUTPUT: &str = "kline-chart.yaml";

pub fn run_init(output: Option<PathBuf>, force: bool, defaults: bool) -> Result<()> {
    let output = output
        .or_else(AppConfig::default_path)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_OUTPUT));
    if output.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            output.display()
        ));
    }

    let mut config = AppConfig::default();
    if !defaults && console::user_attended() {
        prompt(&mut config)?;
    }
    config.validate().context("generated configuration is invalid")?;

    write_config(&config, &output)?;
    println!("{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );
    Ok(())
}

fn prompt(config: &mut AppConfig) -> Result<()> {
    println!("{}", style("kline-chart configuration").bold().cyan());
    let theme = ColorfulTheme::default();

    config.feed.url = Input::with_theme(&theme)
        .with_prompt("Feed URL")
        .default(config.feed.url.clone())
        .interact_text()?;
    config.feed.event = Input::with_theme(&theme)
        .with_prompt("Candle event name")
        .default(config.feed.event.clone())
        .interact_text()?;
    config.page.title = Input::with_theme(&theme)
        .with_prompt("Page title")
        .default(config.page.title.clone())
        .interact_text()?;
    Ok(())
}

fn write_config(config: &AppConfig, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context(format!("failed to create {}", parent.display()))?;
        }
    }
    let yaml = config.to_yaml()?;
    std::fs::write(output, yaml)
        .context(format!("failed to write config to {}", output.display()))?;
    Ok(())
}
