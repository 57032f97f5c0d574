//! Drives the engine through a simulated watch session: bind, speed up,
//! navigate to a fresh player, tear down. Run with RUST_LOG=debug to watch
//! the reconcile machinery.

use tempo_dom::NodeId;
use tempo_engine::{BindingManager, EngineConfig, Host};

fn build_player(host: &mut Host) -> (NodeId, NodeId) {
    let doc = &mut host.doc;
    let root = doc.root();

    let page_manager = doc.create_element("div");
    doc.set_id(page_manager, "page-manager");
    doc.append_child(root, page_manager);

    let watch = doc.create_element("ytd-watch-flexy");
    doc.append_child(page_manager, watch);

    let player = doc.create_element("div");
    doc.set_id(player, "movie_player");
    doc.append_child(watch, player);

    let chrome = doc.create_element("div");
    doc.add_class(chrome, "ytp-chrome-controls");
    doc.append_child(player, chrome);

    let time_display = doc.create_element("div");
    doc.add_class(time_display, "ytp-time-display");
    doc.append_child(chrome, time_display);

    let controls = doc.create_element("div");
    doc.add_class(controls, "ytp-right-controls");
    doc.append_child(chrome, controls);

    let video = doc.create_element("video");
    doc.add_class(video, "html5-main-video");
    doc.set_attribute(video, "src", "/stream/1");
    doc.append_child(player, video);

    host.media.register(video);
    if let Some(state) = host.media.state_mut(video) {
        state.duration = 1_245.0;
        state.paused = false;
    }
    (player, video)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut host = Host::new();
    let (player, video) = build_player(&mut host);
    let mut engine = BindingManager::with_memory_store(EngineConfig::default());

    engine.navigate("/watch?v=first", 0);
    engine.pump(&mut host, 250);
    println!("bound: {:?}", engine.current_binding());

    // Two shortcut presses: 1.00 -> 1.05 -> 1.10.
    engine.handle_key(&mut host, "]");
    engine.handle_key(&mut host, "]");
    println!("rate: {:?}", host.media.playback_rate(video));

    // The host rebuilds the player on navigation; the engine follows.
    host.doc.remove(player);
    let (_, fresh_video) = build_player(&mut host);
    engine.navigate("/watch?v=second", 1_000);
    engine.pump(&mut host, 1_250);
    println!(
        "rate after rebuild: {:?}",
        host.media.playback_rate(fresh_video)
    );

    engine.teardown(&mut host);
    let stats = engine.stats();
    println!(
        "reconciles={} rebinds={} injections={} teardowns={}",
        stats.reconciles, stats.rebinds, stats.ui_injections, stats.teardowns
    );
}
