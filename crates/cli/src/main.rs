use clap::Parser;
use rtsp_core::Server;
use rtsp_core::resource::registry::DEFAULT_RESOURCE_PATH;
use rtsp_core::resource::{MediaDescription, MediaDescriptionGroup, MediaKind, ResourceDescription};
use std::io;

#[derive(Parser)]
#[command(
    name = "rtsp-media-server",
    about = "Standalone RTP/RTSP media-delivery server"
)]
struct Args {
    /// Bind address (host:port)
    #[arg(long, short, default_value = "0.0.0.0:8554")]
    bind: String,

    /// Name advertised in the SDP `s=` line for the demo resource.
    #[arg(long, default_value = "Stream")]
    stream_name: String,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut server = Server::new(&args.bind);

    let video = MediaDescription::new(
        MediaKind::Video,
        "video0",
        96,
        5004,
        90000,
        0.0,
        "",
        "",
        "",
        "",
    );
    let group = MediaDescriptionGroup::new(vec![video]).expect("single-member group is valid");
    let resource = ResourceDescription::new(&args.stream_name, "", "", "", "", 0, 0.0, "", "")
        .with_media(vec![group]);
    server
        .resources()
        .add(DEFAULT_RESOURCE_PATH, resource);
    server.resources().set_default(DEFAULT_RESOURCE_PATH);

    if let Err(e) = server.start() {
        eprintln!("Failed to start server: {}", e);
        return;
    }

    println!("RTSP server on {} — press Enter to stop", args.bind);
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();

    server.stop();
}
