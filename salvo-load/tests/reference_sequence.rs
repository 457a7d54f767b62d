//! The reference configuration must keep producing the historical request mix

use salvo_config::LoadConfig;
use salvo_load::{Catalog, RequestStream, Target};

const REFERENCE_MAP1_VS_MAPS: &str =
    "0010011100111101101100010010101101011101110100011001101110000011010010111011101100000001100001010100";

#[test]
fn test_reference_configuration_sequence() {
    let config = LoadConfig::default();
    let stream = RequestStream::from_config(&config).unwrap();

    let observed: String = stream
        .take(config.shot_count as usize)
        .map(|target| {
            if target.as_str().ends_with("/map1") {
                '0'
            } else {
                '1'
            }
        })
        .collect();

    assert_eq!(observed, REFERENCE_MAP1_VS_MAPS);
}

#[test]
fn test_same_seed_same_targets() {
    let catalog = || {
        Catalog::new(
            ["/a", "/b", "/c"]
                .iter()
                .map(|p| Target::new(format!("127.0.0.1:9000{p}")))
                .collect(),
        )
        .unwrap()
    };

    let first: Vec<Target> = RequestStream::new(catalog(), 42, 500).unwrap().take(200).collect();
    let second: Vec<Target> = RequestStream::new(catalog(), 42, 500).unwrap().take(200).collect();
    let other: Vec<Target> = RequestStream::new(catalog(), 43, 500).unwrap().take(200).collect();

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn test_restart_replays_from_seed() {
    let mut stream = RequestStream::from_config(&LoadConfig::default()).unwrap();
    let head: Vec<Target> = stream.by_ref().take(30).collect();
    assert_eq!(stream.draws(), 30);

    stream.restart();
    assert_eq!(stream.draws(), 0);
    assert_eq!(stream.take(30).collect::<Vec<_>>(), head);
}
