use clap::Parser;
use gmail_export::cli::{AuthCommand, Cli, Command};

#[test]
fn parses_auth_login() {
    let cli = Cli::try_parse_from(["gmail-export", "auth", "login"]).expect("cli parse should work");
    match cli.command {
        Command::Auth(auth) => assert!(matches!(auth.command, AuthCommand::Login)),
        _ => panic!("expected auth command"),
    }
}

#[test]
fn parses_export_defaults() {
    let cli = Cli::try_parse_from(["gmail-export", "export"]).expect("cli parse should work");
    match cli.command {
        Command::Export(export) => {
            assert_eq!(export.output, "stdout");
            assert!(!export.split);
            assert_eq!(export.format, "json");
            assert_eq!(export.area, "all");
            assert_eq!(export.user, "me");
            assert!(export.message.is_none());
        }
        _ => panic!("expected export command"),
    }
}

#[test]
fn parses_export_filter_and_statement_flags() {
    let cli = Cli::try_parse_from([
        "gmail-export",
        "export",
        "-l",
        "work",
        "-f",
        "alice@example.com",
        "-s",
        "report",
        "-O",
        "out.txt",
        "-S",
        "-F",
        "txt",
        "-A",
        "small",
    ])
    .expect("cli parse should work");

    match cli.command {
        Command::Export(export) => {
            assert_eq!(export.label.as_deref(), Some("work"));
            assert_eq!(export.from.as_deref(), Some("alice@example.com"));
            assert_eq!(export.subject.as_deref(), Some("report"));
            assert_eq!(export.output, "out.txt");
            assert!(export.split);
            assert_eq!(export.format, "txt");
            assert_eq!(export.area, "small");
        }
        _ => panic!("expected export command"),
    }
}

#[test]
fn rejects_unknown_area_value() {
    let result = Cli::try_parse_from(["gmail-export", "export", "-A", "medium"]);
    assert!(result.is_err());
}

#[test]
fn rejects_unknown_format_value() {
    let result = Cli::try_parse_from(["gmail-export", "export", "-F", "xml"]);
    assert!(result.is_err());
}
