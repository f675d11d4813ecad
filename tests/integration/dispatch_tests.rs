//! Wire-level tests against a running dispatcher

use crate::common::{spawn_dispatcher, stub_report};
use scrape_dispatch::protocol::{EnrichmentResult, FrameCodec, Job};
use scrape_dispatch::worker::EnrichmentError;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

async fn submit(addr: SocketAddr, url: String) -> EnrichmentResult {
    let codec = FrameCodec::default();
    let mut stream = TcpStream::connect(addr).await.unwrap();
    codec.write(&mut stream, &Job::new(url, vec![])).await.unwrap();
    codec.decode(&mut stream).await.unwrap()
}

#[tokio::test]
async fn test_more_jobs_than_workers_all_complete() {
    const WORKERS: usize = 2;
    const JOBS: usize = 8;

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (r, p) = (Arc::clone(&running), Arc::clone(&peak));

    let addr = spawn_dispatcher(
        move |_job: &Job| {
            let now = r.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            r.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, EnrichmentError>(stub_report())
        },
        WORKERS,
        Duration::from_secs(10),
    )
    .await;

    let clients: Vec<_> = (0..JOBS)
        .map(|i| tokio::spawn(submit(addr, format!("http://site{}.test", i))))
        .collect();

    for client in clients {
        let result = client.await.unwrap();
        assert_eq!(result.report().unwrap().performance.num_requests, 2);
    }
    assert!(peak.load(Ordering::SeqCst) <= WORKERS);
}

#[tokio::test]
async fn test_bad_frame_does_not_stop_dispatcher() {
    let addr = spawn_dispatcher(crate::common::ok_enricher, 1, Duration::from_secs(5)).await;

    // Header promises 10 bytes of garbage
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&10u32.to_be_bytes()).await.unwrap();
    stream.write_all(b"not json!!").await.unwrap();
    drop(stream);

    let result = submit(addr, "http://after.test".to_string()).await;
    assert!(!result.is_failure());
}

#[tokio::test]
async fn test_one_result_per_connection() {
    let addr = spawn_dispatcher(crate::common::ok_enricher, 1, Duration::from_secs(5)).await;
    let codec = FrameCodec::default();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    codec.write(&mut stream, &Job::new("http://one.test", vec![])).await.unwrap();
    let _: EnrichmentResult = codec.decode(&mut stream).await.unwrap();

    // The dispatcher closes after the result
    let next: Result<EnrichmentResult, _> = codec.decode(&mut stream).await;
    assert!(next.unwrap_err().is_connection_closed());
}
