use serde_json::{json, Value};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use terrane::{Instance, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

fn write_document(root: &Path, relative: &str, document: &Value) {
    let path = root.join("data/minecraft").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(document).unwrap()).unwrap();
}

/// A 16 block tall world: stone up to y = 6, water at y = 7, air above.
fn write_pack(root: &Path) {
    write_document(
        root,
        "worldgen/noise_settings/overworld.json",
        &json!({
            "sea_level": 8,
            "noise": { "min_y": 0, "height": 16, "size_horizontal": 1, "size_vertical": 1 },
            "default_block": { "Name": "minecraft:stone" },
            "default_fluid": { "Name": "minecraft:water", "Properties": { "level": "0" } },
            "noise_router": { "final_density": "minecraft:test/slope" }
        }),
    );
    write_document(
        root,
        "worldgen/density_function/test/slope.json",
        &json!({
            "type": "minecraft:y_clamped_gradient",
            "from_y": 0, "to_y": 13, "from_value": 1.0, "to_value": -1.0
        }),
    );
    write_document(
        root,
        "worldgen/density_function/broken.json",
        &json!({ "type": "minecraft:teleport" }),
    );
    write_document(
        root,
        "worldgen/noise/test/bumps.json",
        &json!({ "firstOctave": -4, "amplitudes": [1.0, 0.5] }),
    );
}

fn expected_column() -> String {
    let mut column = "stone,".repeat(7);
    column.push_str("water,");
    column.push_str(&"air,".repeat(8));
    column
}

fn config(pack: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.datapack.path = pack.to_path_buf();
    config.network.host = "127.0.0.1".to_owned();
    config
}

fn instance(pack: &Path) -> Arc<Instance> {
    Arc::new(Instance::new(config(pack)).unwrap())
}

async fn start(instance: &Arc<Instance>) -> (SocketAddr, oneshot::Sender<()>) {
    let server = Arc::new(tiny_http::Server::http("127.0.0.1:0").unwrap());
    let addr = server.server_addr().to_ip().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let instance = Arc::clone(instance);
    tokio::spawn(async move {
        instance
            .serve(server, async {
                let _ = stopped.await;
            })
            .await
    });

    (addr, stop)
}

async fn send(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    (status, raw[split + 4..].to_vec())
}

fn error_message(body: &[u8]) -> String {
    let body: Value = serde_json::from_slice(body).unwrap();
    body["error"].as_str().unwrap().to_owned()
}

#[test]
fn test_load_summary() {
    let pack = TempDir::new().unwrap();
    write_pack(pack.path());

    let instance = instance(pack.path());
    assert!(!instance.is_ready());

    let summary = instance.load_datapack();
    assert!(instance.is_ready());
    assert_eq!(summary.documents, 4);
    assert!(summary.missing_categories.is_empty());
    assert!(summary.failed_categories.is_empty());
    assert_eq!(summary.report.applied(), 3);
    assert_eq!(summary.report.failed(), 1);
    assert_eq!(instance.last_load(), Some(summary));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chunk_endpoint() {
    let pack = TempDir::new().unwrap();
    write_pack(pack.path());
    let instance = instance(pack.path());
    let (addr, stop) = start(&instance).await;

    // Listener is up before the load.
    let (status, _) = send(addr, "POST", "/chunk", r#"{"xOffset": 0, "zOffset": 0}"#).await;
    assert_eq!(status, 503);

    let loader = Arc::clone(&instance);
    tokio::task::spawn_blocking(move || loader.load_datapack()).await.unwrap();

    let (status, first) = send(addr, "POST", "/chunk", r#"{"xOffset": 0, "zOffset": 0}"#).await;
    assert_eq!(status, 200);
    let columns: Vec<String> = serde_json::from_slice(&first).unwrap();
    assert_eq!(columns.len(), 12544);
    assert!(columns.iter().all(|column| *column == expected_column()));

    let (_, second) = send(addr, "POST", "/chunk", r#"{"xOffset": 0, "zOffset": 0}"#).await;
    assert_eq!(first, second);

    let (status, body) = send(addr, "POST", "/chunk", r#"{"xOffset": "a", "zOffset": 0}"#).await;
    assert_eq!(status, 400);
    assert!(error_message(&body).contains("xOffset"));

    let (status, _) = send(addr, "GET", "/chunk", "").await;
    assert_eq!(status, 405);

    let (status, _) = send(addr, "POST", "/terrain", "{}").await;
    assert_eq!(status, 404);

    stop.send(()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_pack() {
    let pack = TempDir::new().unwrap();
    let instance = instance(&pack.path().join("not-here"));
    let (addr, stop) = start(&instance).await;

    let loader = Arc::clone(&instance);
    let summary = tokio::task::spawn_blocking(move || loader.load_datapack()).await.unwrap();
    assert_eq!(summary.missing_categories.len(), 3);
    assert_eq!(summary.documents, 0);

    let (status, body) = send(addr, "POST", "/chunk", r#"{"xOffset": 16, "zOffset": -16}"#).await;
    assert_eq!(status, 500);
    assert!(error_message(&body).contains("minecraft:overworld"));

    stop.send(()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_body_limit() {
    let pack = TempDir::new().unwrap();
    write_pack(pack.path());

    let mut config = config(pack.path());
    config.network.max_body_bytes = 64;
    let instance = Arc::new(Instance::new(config).unwrap());
    instance.load_datapack();
    let (addr, stop) = start(&instance).await;

    let padded = format!(r#"{{"xOffset": 0, "zOffset": 0, "note": "{}"}}"#, "x".repeat(64));
    let (status, body) = send(addr, "POST", "/chunk", &padded).await;
    assert_eq!(status, 413);
    assert!(error_message(&body).contains("64 bytes"));

    let (status, _) = send(addr, "POST", "/chunk", r#"{"xOffset": 0, "zOffset": 0}"#).await;
    assert_eq!(status, 200);

    stop.send(()).unwrap();
}
