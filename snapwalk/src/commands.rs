use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("snapwalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("snapwalk")
        .styles(CLAP_STYLING)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl profiles breadth-first, following the accounts that liked or \
                commented on their images. Saves each profile under the output directory.",
                )
                .arg(
                    arg!(-i --"input" <FILE_OR_LOGIN>)
                        .required(true)
                        .help("A newline-delimited file of logins, or a single login"),
                )
                .arg(
                    arg!(-d --"depth" <NUM>)
                        .required(false)
                        .help(
                            "How many generations of discovered profiles to follow. Profiles \
                        found in the last generation are still crawled, without discovering \
                        more (depth 1 crawls the seeds and the accounts they link to)",
                        )
                        .value_parser(clap::value_parser!(u32))
                        .default_value("1"),
                )
                .arg(
                    arg!(-w --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async workers crawling profiles concurrently")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Directory to save profiles and images into")
                        .default_value("."),
                )
                .arg(
                    arg!(-c --"check")
                        .required(false)
                        .help("Skip profiles that already have a directory in the output")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"base-url" <URL>)
                        .required(false)
                        .help("Base URL of the profile host")
                        .value_parser(clap::value_parser!(Url))
                        .default_value(snapwalk_scanner::source::DEFAULT_BASE_URL),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-q --"quiet" "Suppress the progress spinner and per-profile lines")
                        .required(false)
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
