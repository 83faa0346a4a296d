//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 端到端场景：配置 -> 节点 -> dump 策略
//! - 节点行为性质 (FIFO、暂停、取消、失败隔离)

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ContractError, EmitEventFn, NodeEvent, Packet, SharedDumpStrategy};
    use dumper::PacketDumper;
    use parking_lot::Mutex;

    pub type Calls = Arc<Mutex<Vec<(String, Vec<u8>)>>>;
    pub type Events = Arc<Mutex<Vec<NodeEvent>>>;

    /// Strategy that records every call and fails when `fail_on` matches
    pub fn recording_strategy(fail_on: Option<&'static str>) -> (SharedDumpStrategy, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let strategy: SharedDumpStrategy =
            Arc::new(move |packet: &Packet, destination: &str| -> Result<(), ContractError> {
                sink.lock()
                    .push((destination.to_string(), packet.payload.to_vec()));
                match fail_on {
                    Some(needle) if destination.contains(needle) => {
                        Err(ContractError::dump(destination, "refused by test strategy"))
                    }
                    _ => Ok(()),
                }
            });
        (strategy, calls)
    }

    pub fn collecting_emitter() -> (EmitEventFn, Events) {
        let events: Events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let emitter: EmitEventFn = Arc::new(move |event: NodeEvent| sink.lock().push(event));
        (emitter, events)
    }

    /// Poll until the node has handled `expected` packets
    pub async fn wait_completed(node: &PacketDumper, expected: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while node.metrics().completed() < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("node did not handle packets in time");
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{NodeIdAllocator, NodeState, Packet, PacketRef};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(NodeState::default(), NodeState::Running);
    }

    #[test]
    fn test_packet_ref_is_copied() {
        let mut buffer = vec![1u8, 2, 3];
        let packet: Packet = PacketRef::new(5, 1, &buffer).into();
        buffer[0] = 9;
        assert_eq!(&packet.payload[..], &[1, 2, 3]);
        assert_eq!(packet.pts, 5);
    }

    #[test]
    fn test_ids_are_unique_per_allocator() {
        let a = NodeIdAllocator::new();
        let b = NodeIdAllocator::new();
        assert_eq!(a.next_id().get(), 1);
        assert_eq!(a.next_id().get(), 2);
        assert_eq!(b.next_id().get(), 1);
    }
}

#[cfg(test)]
mod scenario_tests {
    use std::time::Duration;

    use contracts::{ContractError, NamingData, NodeEvent, NodeId, Packet};
    use dumper::{DumperError, PacketDumper};
    use tokio_util::sync::CancellationToken;

    use crate::support::{collecting_emitter, recording_strategy, wait_completed};

    /// Files named from count and stream index hold the payload verbatim
    #[tokio::test]
    async fn test_dump_to_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = NamingData::new();
        data.insert(
            "outputDir".into(),
            dir.path().display().to_string().into(),
        );

        let node = PacketDumper::builder(
            NodeId::new(1),
            "{{outputDir}}/pkt-{{count}}-{{streamIndex}}.raw",
        )
        .data(data)
        .build()
        .unwrap();
        node.start(&CancellationToken::new()).unwrap();

        let payloads: [&[u8]; 3] = [b"first", b"second", b"\x00\x01\xff"];
        for (i, (stream, payload)) in [0usize, 1, 0].into_iter().zip(payloads).enumerate() {
            assert!(node.send(Packet::new(i as i64, stream, payload.to_vec())));
        }
        wait_completed(&node, 3).await;
        node.stop().await;

        assert_eq!(node.metrics().dumped, 3);
        let read = |name: &str| std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(read("pkt-1-0.raw"), b"first");
        assert_eq!(read("pkt-2-1.raw"), b"second");
        assert_eq!(read("pkt-3-0.raw"), b"\x00\x01\xff");
    }

    /// Unknown variables fail rendering; the strategy is never called
    #[tokio::test]
    async fn test_unknown_variable() {
        let (strategy, calls) = recording_strategy(None);
        let (emitter, events) = collecting_emitter();
        let node = PacketDumper::builder(NodeId::new(2), "{{unknownVar}}")
            .strategy(strategy)
            .emitter(emitter)
            .build()
            .unwrap();
        node.start(&CancellationToken::new()).unwrap();

        node.send(Packet::new(0, 0, vec![1u8]));
        wait_completed(&node, 1).await;
        node.stop().await;

        assert!(calls.lock().is_empty());
        let errors: Vec<_> = events.lock().iter().filter(|e| e.is_error()).cloned().collect();
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            NodeEvent::RenderFailed { pattern, data, error, .. } => {
                assert_eq!(pattern, "{{unknownVar}}");
                assert_eq!(data["count"], 1);
                assert!(matches!(**error, ContractError::TemplateRender { .. }));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(node.metrics().render_failures, 1);
    }

    /// A malformed pattern never yields a node
    #[test]
    fn test_malformed_pattern() {
        let result = PacketDumper::builder(NodeId::new(3), "{{").build();
        match result {
            Err(DumperError::Template(ContractError::TemplateParse { pattern, .. })) => {
                assert_eq!(pattern, "{{")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("node created from a malformed pattern"),
        }
    }

    /// One failing dump does not affect its neighbours
    #[tokio::test]
    async fn test_failure_isolation() {
        let (strategy, calls) = recording_strategy(Some("bad"));
        let (emitter, events) = collecting_emitter();
        let node = PacketDumper::builder(
            NodeId::new(4),
            "{{#if (eq count 2)}}bad{{else}}good{{/if}}-{{count}}",
        )
        .strategy(strategy)
        .emitter(emitter)
        .build()
        .unwrap();
        node.start(&CancellationToken::new()).unwrap();

        for pts in 0..3 {
            node.send(Packet::new(pts, 0, Vec::new()));
        }
        wait_completed(&node, 3).await;
        node.stop().await;

        let destinations: Vec<_> = calls.lock().iter().map(|(d, _)| d.clone()).collect();
        assert_eq!(destinations, vec!["good-1", "bad-2", "good-3"]);

        let errors: Vec<_> = events.lock().iter().filter(|e| e.is_error()).cloned().collect();
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            NodeEvent::DumpFailed { destination, .. } => assert_eq!(destination, "bad-2"),
            other => panic!("unexpected event: {other:?}"),
        }

        let metrics = node.metrics();
        assert_eq!(metrics.dumped, 2);
        assert_eq!(metrics.dump_failures, 1);
    }

    /// Nothing is dumped while paused; queued packets follow in order on resume
    #[tokio::test]
    async fn test_pause_then_resume() {
        let (strategy, calls) = recording_strategy(None);
        let node = PacketDumper::builder(NodeId::new(5), "p-{{pts}}")
            .strategy(strategy)
            .build()
            .unwrap();
        assert!(node.pause());
        node.start(&CancellationToken::new()).unwrap();

        node.send(Packet::new(10, 0, Vec::new()));
        node.send(Packet::new(20, 0, Vec::new()));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(calls.lock().is_empty());
        assert_eq!(node.count(), 0);

        assert!(node.resume());
        wait_completed(&node, 2).await;
        node.stop().await;

        let destinations: Vec<_> = calls.lock().iter().map(|(d, _)| d.clone()).collect();
        assert_eq!(destinations, vec!["p-10", "p-20"]);
    }

    /// Config file through to a running node
    #[tokio::test]
    async fn test_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let config = config_loader::ConfigLoader::load_from_str(
            &format!(
                r#"
[node]
pattern = "{{{{dir}}}}/{{{{session}}}}-{{{{count}}}}.bin"

[node.data]
dir = "{}"
session = "s7"

[dump]
strategy = "file"
create_dirs = true
"#,
                out.display()
            ),
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let node = PacketDumper::builder(NodeId::new(6), config.node.pattern.as_str())
            .strategy(dumper::from_config(&config.dump))
            .data(config.node.data.clone())
            .build()
            .unwrap();
        node.start(&CancellationToken::new()).unwrap();
        node.send(Packet::new(0, 0, b"payload".to_vec()));
        wait_completed(&node, 1).await;
        node.stop().await;

        assert_eq!(std::fs::read(out.join("s7-1.bin")).unwrap(), b"payload");
    }
}

#[cfg(test)]
mod property_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{NamingData, NodeEvent, NodeId, NodeState, Packet, PacketRef};
    use dumper::PacketDumper;
    use naming::NamingTemplate;
    use observability::Stater;
    use tokio_util::sync::CancellationToken;

    use crate::support::{collecting_emitter, recording_strategy, wait_completed};

    /// Counter ends at N and names carry 1..N in send order
    #[tokio::test]
    async fn test_count_and_fifo() {
        const N: u64 = 200;
        let (strategy, calls) = recording_strategy(None);
        let node = PacketDumper::builder(NodeId::new(10), "{{count}}:{{pts}}")
            .strategy(strategy)
            .build()
            .unwrap();
        node.start(&CancellationToken::new()).unwrap();

        for pts in 0..N as i64 {
            node.send(Packet::new(pts * 3, 0, Vec::new()));
        }
        wait_completed(&node, N).await;
        node.stop().await;

        assert_eq!(node.count(), N);
        let calls = calls.lock();
        for (i, (destination, _)) in calls.iter().enumerate() {
            assert_eq!(destination, &format!("{}:{}", i + 1, i * 3));
        }
    }

    /// Stop is terminal and idempotent
    #[tokio::test]
    async fn test_cancellation() {
        let (strategy, calls) = recording_strategy(None);
        let (emitter, events) = collecting_emitter();
        let node = PacketDumper::builder(NodeId::new(11), "x-{{count}}")
            .strategy(strategy)
            .emitter(emitter)
            .build()
            .unwrap();
        let ctx = CancellationToken::new();
        node.start(&ctx).unwrap();

        node.send(Packet::new(0, 0, Vec::new()));
        wait_completed(&node, 1).await;

        node.stop().await;
        let after_first_stop = node.metrics();
        node.stop().await;
        assert_eq!(node.metrics(), after_first_stop);
        assert_eq!(node.state(), NodeState::Stopped);

        assert!(!node.handle_packet(PacketRef::new(1, 0, b"late")));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.lock().len(), 1);
        assert_eq!(node.count(), 1);

        let stopped = events
            .lock()
            .iter()
            .filter(|e| matches!(e, NodeEvent::Stopped { .. }))
            .count();
        assert_eq!(stopped, 1);
        assert!(!node.resume());
    }

    /// Same template, same variables, same string
    #[test]
    fn test_rendering_is_repeatable() {
        let template = NamingTemplate::compile("{{a}}/{{count}}-{{pts}}").unwrap();
        let mut data = NamingData::new();
        data.insert("a".into(), "dir".into());
        naming::item_variables(&mut data, 4, &Packet::new(-7, 2, Vec::new()));

        let first = template.render(&data).unwrap();
        for _ in 0..10 {
            assert_eq!(template.render(&data).unwrap(), first);
        }
        assert_eq!(first, "dir/4--7");
    }

    /// Every registered stat samples, work ratio stays within [0, 100]
    #[tokio::test]
    async fn test_stats_bounds() {
        let stater = Arc::new(Stater::new());
        let (strategy, _calls) = recording_strategy(None);
        let node = PacketDumper::builder(NodeId::new(12), "{{count}}")
            .strategy(strategy)
            .stater(Arc::clone(&stater))
            .build()
            .unwrap();
        assert_eq!(stater.len(), 3);

        node.start(&CancellationToken::new()).unwrap();
        for round in 0..5 {
            for pts in 0..20 {
                node.send(Packet::new(pts, 0, vec![0u8; 64]));
            }
            for sample in stater.sample_all() {
                assert!(sample.value >= 0.0, "{} < 0", sample.metadata.name);
                if sample.metadata.unit == "%" {
                    assert!(sample.value <= 100.0, "round {round}: {}", sample.value);
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        wait_completed(&node, 100).await;
        node.stop().await;

        let names: Vec<_> = stater.metadata().into_iter().map(|m| m.name).collect();
        assert!(names.contains(&"pkt_dumper_12.work_ratio".to_string()));
    }
}
