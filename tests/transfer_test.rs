//! Upload a payload, write the manifest, download it back

mod common;

use common::{MockServer, payload};
use nntp_sla::{
    DownloadReport, Downloader, MultipartWriter, NntpError, Nzb, RandomMessageId, Segment,
    UploadReport, Uploader, PostConfig, YencConfig, parse_nzb, yenc_decode,
};
use tokio::io::AsyncReadExt;

const PART_SIZE: usize = 1_000;

fn post_config() -> PostConfig {
    PostConfig::new(
        "SLA <sla@example.com>",
        "alt.binaries.test",
        "Completion test 2026-10-18",
        "@sla.example.com",
    )
}

fn filled_writer(data: &[u8]) -> MultipartWriter {
    let config = YencConfig {
        part_size: PART_SIZE,
        ..YencConfig::default()
    };
    let mut writer = MultipartWriter::new("sla-2026-10-18.zip", config).unwrap();
    writer.write(data).unwrap();
    writer
}

async fn upload(server: &MockServer, data: &[u8]) -> Vec<Segment> {
    let mut writer = filled_writer(data);
    let mut uploader = Uploader::new(post_config(), RandomMessageId::new("@sla.example.com"));
    let mut session = server.session();

    let outcome = uploader.run(&mut session, &mut writer).await.unwrap();
    assert!(outcome.report.is_success());
    assert!(outcome.report.conn >= 0.0);
    assert!(!session.is_connected());
    outcome.segments
}

#[tokio::test]
async fn test_upload_manifest_download() {
    let server = MockServer::start().await;
    let data = payload(2_500);
    let segments = upload(&server, &data).await;

    assert_eq!(segments.len(), 3);
    assert_eq!(server.store.len(), 3);
    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(segment.number as usize, i + 1);
        assert!(segment.message_id.ends_with("@sla.example.com"));
    }

    let nzb = Nzb::build(
        "Completion test 2026-10-18",
        "SLA <sla@example.com>",
        vec!["alt.binaries.test".to_string()],
        1_792_000_000,
        segments,
    );
    let manifest = parse_nzb(&nzb.to_xml().unwrap()).unwrap();
    manifest.validate().unwrap();

    let wanted: Vec<Segment> = manifest.segments().cloned().collect();
    let mut session = server.session();
    let report = Downloader::new(true).run(&mut session, &wanted).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.arts.len(), 3);
    assert_eq!(report.kb_sec.len(), 3);
}

#[tokio::test]
async fn test_parts_reassemble_to_payload() {
    let server = MockServer::start().await;
    let data = payload(2_500);
    let segments = upload(&server, &data).await;

    let mut session = server.session();
    session.init().await.unwrap();
    session.authenticate().await.unwrap();

    let mut assembled = Vec::new();
    for segment in &segments {
        let mut article = Vec::new();
        session
            .article(&segment.message_id)
            .await
            .unwrap()
            .read_to_end(&mut article)
            .await
            .unwrap();

        let decoded = yenc_decode(&article).unwrap();
        decoded.verify().unwrap();
        assert_eq!(decoded.header.total, Some(3));
        assert_eq!(decoded.header.size, 2_500);
        let part = decoded.part.as_ref().unwrap();
        assert_eq!(part.begin as usize, assembled.len() + 1);
        assembled.extend_from_slice(&decoded.data);
    }
    assert_eq!(assembled, data);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_upload_rejected_credentials() {
    let server = MockServer::start().await;
    let mut writer = filled_writer(&payload(10));
    let mut uploader = Uploader::new(post_config(), RandomMessageId::new("@x"));
    let mut session = server.session_with_password("wrong");

    let err = uploader.run(&mut session, &mut writer).await.unwrap_err();
    assert!(!session.is_connected());

    let report = UploadReport::failure(&err);
    assert!(report.arts.is_empty());
    assert!(report.error[0].contains("481 authentication rejected"));
    assert_eq!(server.store.len(), 0);
}

#[tokio::test]
async fn test_download_missing_segment() {
    let server = MockServer::start().await;
    let segments = upload(&server, &payload(2_500)).await;
    server.store.remove(&segments[1].message_id);

    let mut session = server.session();
    let err = Downloader::new(true).run(&mut session, &segments).await.unwrap_err();
    assert_eq!(err.response_line(), Some("430 no such article"));
    assert_eq!(DownloadReport::failure(&err).error.len(), 1);
}

#[tokio::test]
async fn test_download_size_check() {
    let server = MockServer::start().await;
    let mut segments = upload(&server, &payload(500)).await;
    segments[0].bytes = 1_000_000;

    let mut session = server.session();
    let err = Downloader::new(false).run(&mut session, &segments).await.unwrap_err();
    assert!(matches!(err, NntpError::Integrity(_)));
}
