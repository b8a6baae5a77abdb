use domain::Device;
use ems_pipeline::{Delivery, Poller, PollerConfig};
use ems_protocol::{DeviceClient, ProtocolError, frame};
use ems_storage::InMemoryMetricSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// 模拟插座：接受一次连接并回复给定的实时数据。
async fn spawn_plug(voltage_mv: i64, power_mw: i64) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let response = format!(
        r#"{{"emeter":{{"get_realtime":{{"voltage_mv":{},"current_ma":1250,"power_mw":{},"total_wh":42,"err_code":0}}}}}}"#,
        voltage_mv, power_mw
    );
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket.write_all(&frame(response.as_bytes())).await;
    });
    port
}

async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("addr").port()
}

#[tokio::test]
async fn cycle_over_real_devices() {
    let first = spawn_plug(121_300, 151_625).await;
    let second = refused_port().await;
    let third = spawn_plug(230_000, 10_000).await;

    let devices = vec![
        Device::new("rack", "127.0.0.1", first),
        Device::new("desk", "127.0.0.1", second),
        Device::new("tv", "127.0.0.1", third),
    ];
    let sink = Arc::new(InMemoryMetricSink::new());
    let poller = Poller::new(
        devices,
        Arc::new(DeviceClient::new(Duration::from_millis(500))),
        sink.clone(),
        PollerConfig::default(),
    );

    let report = poller.poll_at(1_700_000_000).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].label, "desk");
    assert!(matches!(
        report.failures[0].error,
        ProtocolError::ConnectionRefused(_)
    ));
    assert!(matches!(report.delivery, Delivery::Written));

    let bodies = sink.bodies().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0],
        "energy,plug=rack voltage=121.3,current=1.25,power=151.625,total_wh=42 1700000000\n\
         energy,plug=tv voltage=230.0,current=1.25,power=10.0,total_wh=42 1700000000"
    );
}
