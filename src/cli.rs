use clap::Parser;

use crate::export::OutputFormat;

#[derive(Parser, Debug)]
#[command(version, about = "Convert proxy subscription links into Clash proxies", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "Run config, accept file path or URL")]
    pub config: Option<String>,

    #[arg(short, long, help = "Node subscription URL, may be repeated; loaded before --file")]
    pub url: Vec<String>,

    #[arg(short, long, help = "Node file path, may be repeated; loaded after --url")]
    pub file: Vec<String>,

    #[arg(short, long, help = "Output path, stdout when omitted")]
    pub output: Option<String>,

    #[arg(long, value_enum, help = "Output format")]
    pub format: Option<OutputFormat>,

    #[arg(short, long, help = "Emit debug log")]
    pub verbose: bool,
}
