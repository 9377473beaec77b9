//! Style pairs compiled through the default toolchain.

use std::fs;

use tempfile::TempDir;
use themesmith_core::ThemeConfig;
use themesmith_transform::{StylePair, Toolchain};

fn toolchain(minimize_css: bool) -> Toolchain {
    let mut config = ThemeConfig::defaults("/theme");
    config.minimize_css = minimize_css;
    Toolchain::from_config(&config).expect("toolchain")
}

#[test]
fn base_rules_precede_override_rules_exactly_once() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("section-main.css"),
        ".main { color: red; }\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("section-main.custom.scss"),
        "$accent: blue;\n.main { .title { color: $accent; } }\n",
    )
    .unwrap();

    let pair = StylePair::resolve(dir.path(), "section-main.custom.scss").expect("pair");
    let source = pair.merged_source().expect("merge");
    let css = toolchain(false)
        .style(&pair.output_name, &source, Some(dir.path()))
        .expect("compile");

    let base = css.find("color: red").expect("base rule");
    let over = css.find(".main .title").expect("override rule");
    assert!(base < over, "got:\n{css}");
    assert_eq!(css.matches("color: red").count(), 1);
    assert_eq!(css.matches(".main .title").count(), 1);
}

#[test]
fn partials_resolve_from_the_assets_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("_vars.scss"), "$gap: 4px;\n").unwrap();
    fs::write(
        dir.path().join("grid.scss"),
        "@import 'vars';\n.grid { gap: $gap; }\n",
    )
    .unwrap();

    let pair = StylePair::resolve(dir.path(), "grid.scss").expect("pair");
    assert_eq!(pair.output_name, "grid.css");
    let css = toolchain(false)
        .style(&pair.output_name, &pair.merged_source().unwrap(), Some(dir.path()))
        .expect("compile");
    assert!(css.contains("gap: 4px"), "got:\n{css}");
}

#[test]
fn minified_output_is_smaller() {
    let source = ".a {\n  color: red;\n}\n\n.b {\n  margin: 0;\n}\n";
    let plain = toolchain(false).style("a.css", source, None).unwrap();
    let small = toolchain(true).style("a.css", source, None).unwrap();
    assert!(small.len() < plain.len());
    assert!(small.contains("color:red"));
}
