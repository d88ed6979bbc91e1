use radius_portal::{RadiusClient, RadiusConfig};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage: {} <username> <password> <secret> [server] [port]", args[0]);
        eprintln!("Example: {} alice password testing123 127.0.0.1 1812", args[0]);
        std::process::exit(1);
    }

    let mut config = RadiusConfig {
        secret: args[3].clone(),
        ..Default::default()
    };
    if let Some(server) = args.get(4) {
        config.server = server.clone();
    }
    if let Some(port) = args.get(5) {
        config.port = match port.parse() {
            Ok(port) => port,
            Err(_) => {
                eprintln!("Invalid port: {}", port);
                std::process::exit(1);
            }
        };
    }

    println!("RADIUS Client Test");
    println!("==================");
    println!("Server: {}:{}", config.server, config.port);
    println!("Username: {}", args[1]);
    println!();

    let client = RadiusClient::new(&config);
    let outcome = client.authenticate(&args[1], &args[2]).await;

    if outcome.success {
        println!("✓ {}", outcome.message.unwrap_or_default());
    } else {
        println!("✗ {}", outcome.error.unwrap_or_default());
        std::process::exit(1);
    }
}
