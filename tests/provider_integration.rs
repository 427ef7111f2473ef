//! Live HTTP path of the distance-matrix client against a WireMock stub.
//!
//! Needs Docker: run with `cargo test -- --ignored`.

use std::path::PathBuf;

use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, TestcontainersError};

use route_optimizer::google::{GoogleMapsClient, GoogleMapsConfig};
use route_optimizer::model::{Coordinate, MatrixSource};
use route_optimizer::traits::DistanceMatrixProvider;

fn wiremock_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let mappings = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/wiremock/mappings");

    let image = GenericImage::new("wiremock/wiremock", "3.9.1")
        .with_exposed_port(8080.tcp())
        .with_mount(Mount::bind_mount(
            mappings.to_string_lossy().to_string(),
            "/home/wiremock/mappings",
        ))
        .with_startup_timeout(std::time::Duration::from_secs(60));

    let container = image.start()?;
    let port = container.get_host_port_ipv4(8080.tcp())?;
    let base_url = format!("http://127.0.0.1:{}/maps/api/distancematrix/json", port);

    Ok((container, base_url))
}

fn client(base_url: &str, api_key: &str) -> GoogleMapsClient {
    let mut config = GoogleMapsConfig::new(api_key);
    config.base_url = base_url.to_string();
    config.timeout_secs = 5;
    GoogleMapsClient::new(config).expect("build client")
}

#[test]
#[ignore = "requires docker"]
fn live_matrix_uses_traffic_durations() {
    let (container, base_url) = wiremock_container().expect("start WireMock container");
    let client = client(&base_url, "integration-key");

    let origin = Coordinate::new(45.4642, 9.1900);
    let destinations = [Coordinate::new(45.4720, 9.1878), Coordinate::new(45.4520, 9.1760)];

    // WireMock may still be loading its mappings right after start.
    let matrix = {
        let start = std::time::Instant::now();
        let mut last = client.matrix(origin, &destinations);
        while last.is_estimated() && start.elapsed() < std::time::Duration::from_secs(15) {
            std::thread::sleep(std::time::Duration::from_millis(500));
            last = client.matrix(origin, &destinations);
        }
        last
    };

    if matrix.is_estimated() {
        if let Ok(stdout) = container.stdout_to_vec() {
            eprintln!("WireMock stdout:\n{}", String::from_utf8_lossy(&stdout));
        }
    }
    assert_eq!(matrix.source, MatrixSource::Live);
    assert_eq!(matrix.entries.len(), 2);
    assert_eq!(matrix.entries[0].distance_meters, 1400.0);
    assert_eq!(matrix.entries[0].effective_duration(), 540.0);
    // Navigli is slower on paper but faster in current traffic.
    assert_eq!(matrix.closest(), Some(1));

    drop(container);
}

#[test]
#[ignore = "requires docker"]
fn rejected_key_degrades_to_estimate() {
    let (container, base_url) = wiremock_container().expect("start WireMock container");
    let client = client(&base_url, "wrong-key");

    let origin = Coordinate::new(45.4642, 9.1900);
    let destination = Coordinate::new(45.4720, 9.1878);

    let matrix = client.matrix(origin, &[destination]);
    assert!(matrix.is_estimated());
    assert_eq!(client.point_distance(origin, destination).source, MatrixSource::Estimated);

    drop(container);
}
