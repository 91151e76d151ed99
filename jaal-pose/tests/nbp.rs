//! NBP estimator behaviour through the public API.

mod common;

use jaal_pose::inference::{NodeKind, ROOT};
use jaal_pose::{Error, Estimator, PART_KEYS, Priors};

#[test]
fn test_nbp_lifecycle() {
    common::init_logging();
    let map = common::disc_map(120, 120, 60.0, 60.0, 40.0);
    let mut nbp = common::seeded_nbp(map, 21);
    assert_eq!(nbp.name(), "nbp");
    assert!(matches!(nbp.estimate(), Err(Error::NotInitialized)));

    let init = nbp.init(6, false).unwrap();
    assert_eq!(init.num_entries(), 9 * 6);

    for _ in 0..2 {
        let lists = nbp.update().unwrap();
        for key in PART_KEYS {
            assert_eq!(lists.get(key).unwrap().len(), 6, "{}", key);
        }
    }

    let est = nbp.estimate().unwrap();
    for key in PART_KEYS {
        let entries = est.get(key).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_nbp_graph_after_update() {
    let mut nbp = common::seeded_nbp(common::full_map(80, 80), 22);
    nbp.init(5, false).unwrap();
    nbp.update().unwrap();

    let graph = nbp.graph();
    for node in graph.nodes() {
        assert_eq!(node.belief().len(), 5);
        assert_eq!(node.belief().dim(), node.kind().dim());
        let total: f64 = node.belief().weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
    for inner in 1..=4 {
        assert_eq!(NodeKind::of(inner), NodeKind::Inner);
        assert!(graph.message(inner, ROOT).is_some_and(|m| m.dim() == 3));
        assert!(graph.message(ROOT, inner).is_some_and(|m| m.dim() == 5));
        assert!(graph.message(inner + 4, inner).is_some_and(|m| !m.is_empty()));
        assert!(graph.message(inner, inner + 4).is_some_and(|m| !m.is_empty()));
    }
}

#[test]
fn test_nbp_informed_init() {
    let priors = Priors {
        circles: vec![[50.0, 50.0, 10.0]],
        rectangles: vec![[80.0, 50.0, 0.0, 27.0, 8.0]],
    };
    let mut nbp = common::seeded_nbp(common::full_map(100, 100), 23).with_priors(priors);
    let lists = nbp.init(10, true).unwrap();
    for link in lists.get("l1").unwrap() {
        assert!((link[0] - 80.0).abs() < 60.0);
        assert!((link[3] - 27.0).abs() < 12.0);
    }
}
