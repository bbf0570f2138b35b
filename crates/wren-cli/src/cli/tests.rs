#[cfg(test)]
mod tests {
    use crate::cli::validation::parse_import_override;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_parse_import_override_valid() {
        assert_eq!(
            parse_import_override("lit=/vendor/lit.js"),
            Ok(("lit".to_string(), "/vendor/lit.js".to_string()))
        );
        assert_eq!(
            parse_import_override(" @org/ui/ = /packages/ui/src/ "),
            Ok(("@org/ui/".to_string(), "/packages/ui/src/".to_string()))
        );
        // Only the first `=` separates.
        assert_eq!(
            parse_import_override("x=https://esm.sh/x?deps=y"),
            Ok(("x".to_string(), "https://esm.sh/x?deps=y".to_string()))
        );
    }

    #[test]
    fn test_parse_import_override_invalid() {
        assert!(parse_import_override("lit").is_err());
        assert!(parse_import_override("=/vendor/lit.js").is_err());
        assert!(parse_import_override("lit=").is_err());
        assert!(parse_import_override("bad\u{0}key=/x.js").is_err());
    }

    #[test]
    fn test_cli_verbose_quiet_conflict() {
        let result = Cli::try_parse_from(["wren", "--verbose", "--quiet", "serve"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_args_defaults() {
        let args = Cli::try_parse_from(["wren", "serve"]).unwrap();

        let Command::Serve(serve) = args.command else {
            panic!("Expected Serve command");
        };
        assert!(serve.config.root.is_none());
        assert!(serve.config.imports.is_empty());
        assert!(serve.port.is_none());
        assert!(serve.host.is_none());
        assert!(serve.ignore.is_empty());
        assert!(!serve.no_import_map);
        assert!(!serve.no_reload);
    }

    #[test]
    fn test_serve_args_full() {
        let args = Cli::try_parse_from([
            "wren",
            "serve",
            "site",
            "--port",
            "9000",
            "--debounce-ms",
            "250",
            "--ignore",
            "coverage/**",
            "--ignore",
            "*.log",
            "--import",
            "lit=/vendor/lit.js",
            "--import-map",
            "importmap.json",
            "--no-reload",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        let Command::Serve(serve) = args.command else {
            panic!("Expected Serve command");
        };
        assert_eq!(serve.config.root, Some(PathBuf::from("site")));
        assert_eq!(serve.port, Some(9000));
        assert_eq!(serve.debounce_ms, Some(250));
        assert_eq!(serve.ignore, vec!["coverage/**", "*.log"]);
        assert_eq!(
            serve.config.imports,
            vec![("lit".to_string(), "/vendor/lit.js".to_string())]
        );
        assert_eq!(
            serve.config.import_map_override,
            Some(PathBuf::from("importmap.json"))
        );
        assert!(serve.no_reload);
    }

    #[test]
    fn test_bad_import_flag_is_rejected() {
        let result = Cli::try_parse_from(["wren", "serve", "--import", "lit"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_importmap_args() {
        let args = Cli::try_parse_from(["wren", "--no-color", "importmap", ".", "--compact"])
            .unwrap();
        assert!(args.no_color);
        let Command::Importmap(importmap) = args.command else {
            panic!("Expected Importmap command");
        };
        assert_eq!(importmap.config.root, Some(PathBuf::from(".")));
        assert!(importmap.compact);
    }
}
