//! cfml - command line front-end for CFML script.
//! cfml - CFML 脚本的命令行前端。

mod args;
mod commands;
mod error;
mod output;

use args::{ParseArgs, PolicyArg};
use cfml_fmt::FormatConfig;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

/// Main CLI structure.
/// 主 CLI 结构体。
#[derive(Parser)]
#[command(name = "cfml")]
#[command(author, version, about = "Parse, check and reformat CFML script", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output and debug logging. / 启用详细输出。
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress the final error line. / 抑制错误输出。
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Available CLI commands.
/// 可用的 CLI 命令。
#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a file. / 解析并验证文件。
    Check {
        /// The file to check. / 要检查的文件。
        file: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,

        /// How unknown attributes are reported. / 未知属性的报告方式。
        #[arg(long, value_enum, default_value = "warn")]
        attributes: PolicyArg,

        /// Print diagnostics as JSON records. / 以 JSON 输出诊断。
        #[arg(long)]
        json: bool,
    },

    /// Print the tokens of a file. / 打印文件的 token。
    Tokens {
        file: PathBuf,
    },

    /// Print the parse tree of a file. / 打印文件的解析树。
    Tree {
        file: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Format a file. / 格式化文件。
    Fmt {
        /// The file to format. / 要格式化的文件。
        file: PathBuf,

        /// Write changes to the file. / 将更改写入文件。
        #[arg(short, long, conflicts_with = "check")]
        write: bool,

        /// Only check that the file is formatted. / 仅检查文件是否已格式化。
        #[arg(long)]
        check: bool,

        /// Indent with this many spaces instead of tabs. / 使用空格缩进。
        #[arg(long, value_name = "WIDTH")]
        indent: Option<usize>,
    },

    /// Run parser fixture files. / 运行解析器夹具文件。
    Fixture {
        /// Source files or directories of `.cfc` / `.cfm` files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Regenerate expectations of failing fixtures. / 重新生成失败夹具的期望结果。
        #[arg(long)]
        update: bool,
    },
}

/// Tabs unless `--indent` asks for spaces.
fn format_config(indent: Option<usize>) -> FormatConfig {
    match indent {
        Some(width) => FormatConfig::new().indent_width(width),
        None => FormatConfig::new(),
    }
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

/// Main entry point.
/// 主入口点。
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            file,
            parse,
            attributes,
            json,
        } => commands::check::run(&file, &parse, attributes, json, cli.verbose),
        Commands::Tokens { file } => commands::tokens::run(&file),
        Commands::Tree { file, parse } => commands::tree::run(&file, &parse, cli.verbose),
        Commands::Fmt {
            file,
            write,
            check,
            indent,
        } => {
            let config = format_config(indent);
            let mode = if check {
                commands::fmt::Mode::Check
            } else if write {
                commands::fmt::Mode::Write
            } else {
                commands::fmt::Mode::Print
            };
            commands::fmt::run(&file, &config, mode)
        }
        Commands::Fixture { paths, update } => commands::fixture::run(&paths, update),
    };

    if let Err(e) = result {
        if !cli.quiet {
            output::error(&e.to_string());
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfml_fmt::Indent;

    fn fmt_indent(args: &[&str]) -> Option<usize> {
        match Cli::try_parse_from(args).map(|cli| cli.command) {
            Ok(Commands::Fmt { indent, .. }) => indent,
            _ => panic!("expected fmt"),
        }
    }

    #[test]
    fn test_fmt_indent_flag() {
        assert_eq!(format_config(fmt_indent(&["cfml", "fmt", "a.cfm"])).indent, Indent::Tab);
        let spaces = format_config(fmt_indent(&["cfml", "fmt", "a.cfm", "--indent", "2"]));
        assert_eq!(spaces.indent, Indent::Spaces(2));
    }

    #[test]
    fn test_fmt_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["cfml", "fmt", "a.cfm", "--tabs"]).is_err());
    }
}
