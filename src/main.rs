use anyhow::{bail, Context};
use clap::Parser;
use dns_client::{Client, ClientConfig, Transport, DEFAULT_PORT};
use dns_message::{DomainName, Type};
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dnsq")]
#[command(version)]
#[command(about = "Ask a DNS server a single question")]
struct Cli {
    /// Name to look up, or an IP address with --reverse
    target: String,

    /// Record type to ask for
    #[arg(short = 't', long = "type", default_value = "A")]
    r_type: Type,

    /// Look up the name of an IP address
    #[arg(short = 'x', long, conflicts_with = "r_type")]
    reverse: bool,

    /// Server to ask
    #[arg(short = 's', long, default_value = "8.8.8.8")]
    server: IpAddr,

    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seconds to wait for each step of the exchange
    #[arg(long, default_value_t = 7)]
    timeout: u64,

    /// Only use TCP
    #[arg(long, conflicts_with = "no_tcp_fallback")]
    tcp: bool,

    /// Fail on a truncated UDP response instead of retrying over TCP
    #[arg(long)]
    no_tcp_fallback: bool,

    /// Log each exchange
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let transport = if self.tcp {
            Transport::Tcp
        } else if self.no_tcp_fallback {
            Transport::UdpOnly
        } else {
            Transport::Udp
        };

        ClientConfig::new(self.server)
            .port(self.port)
            .timeout(Duration::from_secs(self.timeout))
            .transport(transport)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config();
    debug!("Using {:?}", config);
    let client = Client::new(config);

    if cli.reverse {
        let addr: IpAddr = cli
            .target
            .parse()
            .with_context(|| format!("{} is not an IP address", cli.target))?;
        let name = client
            .reverse(addr)
            .with_context(|| format!("reverse lookup of {} failed", addr))?;
        println!("{}", name);
        return Ok(());
    }

    let name: DomainName = cli
        .target
        .parse()
        .with_context(|| format!("{} is not a domain name", cli.target))?;

    match cli.r_type {
        Type::A | Type::AAAA => {
            let addresses = client
                .lookup(&name, cli.r_type)
                .with_context(|| format!("{} lookup of {} failed", cli.r_type, name))?;
            for addr in addresses {
                println!("{}", addr);
            }
        }
        Type::MX => {
            let exchangers = client
                .mail_exchangers(&name)
                .with_context(|| format!("MX lookup of {} failed", name))?;
            for (preference, exchange) in exchangers {
                println!("{} {}", preference, exchange);
            }
        }
        r_type => {
            let response = client
                .resolve(&name, r_type)
                .with_context(|| format!("{} lookup of {} failed", r_type, name))?;
            if response.answers.is_empty() {
                bail!("no {} records for {}", r_type, name);
            }
            for answer in response.answers.iter() {
                println!("{}", answer);
            }
        }
    }

    Ok(())
}
