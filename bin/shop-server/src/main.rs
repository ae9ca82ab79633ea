use clap::Parser;
use common::init_logger;
use shop_server::{run_server, Result, ShopServerArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ShopServerArgs::parse();

    init_logger(&args.log_level).expect("Logger should initialize");

    run_server(args).await
}
