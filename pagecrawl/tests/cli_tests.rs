#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use std::process::{Command, Output};

    const SITE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/site.yml");
    const SETTINGS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/crawler.toml");

    fn pagecrawl(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_pagecrawl"))
            .args(args)
            .env("RUST_LOG", "error")
            .output()
            .expect("Failed to run pagecrawl binary")
    }

    fn json_output(args: &[&str]) -> Value {
        let output = pagecrawl(args);
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("Output is not JSON")
    }

    #[test]
    fn test_resolve_page() {
        let out = json_output(&["resolve", "--site", SITE, "--page", "12"]);

        assert_eq!(out["page"], json!(12));
        let configurations = out["configurations"].as_object().unwrap();
        let mut names: Vec<&String> = configurations.keys().collect();
        names.sort();
        assert_eq!(names, vec!["default", "news", "public"]);
        assert_eq!(out["configurations"]["news"]["origin"], json!("tx_crawler_configuration_2"));
        assert_eq!(out["configurations"]["default"]["origin"], json!("pagets"));
        assert_eq!(
            out["configurations"]["default"]["urls"],
            json!(["?id=12&L=0", "?id=12&L=1"])
        );
        assert_eq!(out["diagnostics"][0]["kind"], json!("access_denied"));
    }

    #[test]
    fn test_resolve_with_filters() {
        let out = json_output(&[
            "resolve",
            "--site",
            SITE,
            "--page",
            "21",
            "--settings",
            SETTINGS,
            "--config",
            "shop,products",
            "--exclude",
            "type=98",
            "--mount-point",
            "3-5",
        ]);

        let configurations = out["configurations"].as_object().unwrap();
        let mut names: Vec<&String> = configurations.keys().collect();
        names.sort();
        assert_eq!(names, vec!["products", "shop"]);
        assert_eq!(
            out["configurations"]["shop"]["urls"],
            json!([
                "?id=21&MP=3-5&tx_shop%5Bpage%5D=1&type=0",
                "?id=21&MP=3-5&tx_shop%5Bpage%5D=2&type=0",
            ])
        );
        assert_eq!(
            out["configurations"]["products"]["urls"]
                .as_array()
                .map(Vec::len),
            Some(3)
        );
    }

    #[test]
    fn test_expand_value() {
        let out = json_output(&["expand", "--value", "[1-3|7]"]);
        assert_eq!(out["values"], json!([1, 2, 3, "7"]));
        assert_eq!(out["diagnostics"], json!([]));

        let out = json_output(&[
            "expand",
            "--site",
            SITE,
            "--value",
            "[_TABLE:sys_category;_FIELD:slug|_TABLE:missing]",
            "--page",
            "21",
        ]);
        assert_eq!(out["values"], json!(["shoes", "bags"]));
        assert_eq!(out["diagnostics"][0]["kind"], json!("unknown_collection"));
    }

    #[test]
    fn test_exclude_list() {
        let out = json_output(&["exclude", "--site", SITE, "--list", "10+1, 30+"]);
        assert_eq!(out["pages"], json!([10, 11, 12, 30]));
    }

    #[test]
    fn test_unknown_page_fails() {
        let output = pagecrawl(&["resolve", "--site", SITE, "--page", "999"]);
        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8_lossy(&output.stderr).contains("page 999"));
    }
}
