use clap::Parser;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use webdav_request::{Client, ClientConfig, DigestContext, Method, UserOptions};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebDAV server URL (can also be set via WEBDAV_URL env var)
    #[arg(short, long)]
    url: Option<String>,

    /// Remote path to fetch
    #[arg(short, long, default_value = "/")]
    path: String,

    /// Send a PROPFIND with the given Depth instead of a GET
    #[arg(long)]
    depth: Option<String>,

    /// Username for digest authentication; a 401 challenge is printed instead of failing
    #[arg(long)]
    digest_user: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let args = Args::parse();

    let url = args
        .url
        .or_else(|| env::var("WEBDAV_URL").ok())
        .ok_or("WebDAV URL must be provided via --url or WEBDAV_URL env var")?;

    let config = ClientConfig::new(url).with_timeout(Duration::from_secs(args.timeout));
    let client = Client::from_config(config)?;

    let mut options = UserOptions::default();
    if let Some(user) = args.digest_user {
        let password = env::var("WEBDAV_PASSWORD").unwrap_or_default();
        options.digest = Some(DigestContext::new(user, password));
    }

    println!("Requesting {}", client.url_for(&args.path));
    let response = match args.depth {
        Some(depth) => {
            let mut headers = webdav_request::header::HeaderMap::new();
            headers.insert("depth", depth.parse()?);
            options.headers = Some(headers);
            client
                .request(Method::from_bytes(b"PROPFIND")?, &args.path, &options)
                .await?
        }
        None => client.request(Method::GET, &args.path, &options).await?,
    };

    println!("Status: {}", response.status);
    for (name, value) in &response.headers {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
    println!("{}", response.text());

    Ok(())
}
