use crate::packages::{self, DEFAULT_PACKAGES_PATH};
use crate::{AbxError, AbxLoader, DecodeOptions, Result, dump};
use clap::{Arg, ArgMatches, Command, value_parser};
use std::io::{self, Write};

pub struct Cli;

impl Cli {
    pub fn build_command() -> Command {
        Command::new("abxtree")
            .about("Inspects Android Binary XML (ABX) files")
            .long_about("Decodes Android Binary XML into a tree and answers queries against it.\n\nInput can be '-' to read from stdin. Set RUST_LOG=debug to see decoder diagnostics.")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(
                Command::new("dump")
                    .about("Print an indented outline of the decoded tree")
                    .arg(
                        Arg::new("input")
                            .help("Input file path (use '-' for stdin)")
                            .required(true)
                            .index(1),
                    )
                    .arg(
                        Arg::new("strict")
                            .long("strict")
                            .help("Fail on mismatching end tags instead of warning")
                            .action(clap::ArgAction::SetTrue),
                    )
                    .arg(
                        Arg::new("max-depth")
                            .long("max-depth")
                            .help("Reject documents nesting deeper than this")
                            .value_parser(value_parser!(usize)),
                    ),
            )
            .subcommand(
                Command::new("find-package")
                    .about("Print the package installed at a code path")
                    .arg(
                        Arg::new("code-path")
                            .help("Install directory, e.g. /data/app/~~abc/com.example-1")
                            .required(true)
                            .index(1),
                    )
                    .arg(Self::packages_arg()),
            )
            .subcommand(
                Command::new("list-packages")
                    .about("Print every package name and code path")
                    .arg(Self::packages_arg()),
            )
    }

    fn packages_arg() -> Arg {
        Arg::new("packages")
            .long("packages")
            .help("Path to the ABX packages file (use '-' for stdin)")
            .default_value(DEFAULT_PACKAGES_PATH)
    }

    pub fn run() -> Result<()> {
        let matches = Self::build_command().get_matches();
        Self::run_with_matches(matches)
    }

    pub fn run_with_matches(matches: ArgMatches) -> Result<()> {
        let stdout = io::stdout();
        Self::execute(&matches, stdout.lock())
    }

    /// Run the parsed command, writing its report to `output`
    pub fn execute<W: Write>(matches: &ArgMatches, mut output: W) -> Result<()> {
        match matches.subcommand() {
            Some(("dump", sub)) => {
                let input = required(sub, "input")?;
                let max_depth = sub.get_one::<usize>("max-depth").copied();
                if max_depth == Some(0) {
                    return Err(AbxError::Cli("--max-depth must be at least 1".to_string()));
                }
                let options = DecodeOptions::new()
                    .strict_end_tags(sub.get_flag("strict"))
                    .max_depth(max_depth);

                let document = AbxLoader::load_path_or_stdin(input, &options)?;
                dump::write_outline(&document, output)?;
                Ok(())
            }

            Some(("find-package", sub)) => {
                let code_path = required(sub, "code-path")?;
                let document =
                    AbxLoader::load_path_or_stdin(required(sub, "packages")?, &DecodeOptions::new())?;

                match packages::find_package_by_code_path(&document, code_path)? {
                    Some(package) => {
                        output.write_all(package.name)?;
                        writeln!(output)?;
                        Ok(())
                    }
                    None => Err(AbxError::Cli(format!(
                        "No package installed at {}",
                        code_path
                    ))),
                }
            }

            Some(("list-packages", sub)) => {
                let document =
                    AbxLoader::load_path_or_stdin(required(sub, "packages")?, &DecodeOptions::new())?;
                for package in packages::packages(&document)? {
                    writeln!(
                        output,
                        "{}\t{}",
                        package.name_lossy(),
                        package.code_path_lossy()
                    )?;
                }
                Ok(())
            }

            _ => Err(AbxError::Cli("No command given".to_string())),
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| AbxError::Cli(format!("Missing argument <{}>", name)))
}
