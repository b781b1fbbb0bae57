use proptest::prelude::*;
use scanplot::config::ScanPolicy;
use scanplot::data::extent::*;

#[test]
fn close_extents_are_averaged() {
    assert_eq!(assumed_square_dimension(98, 100, 5), 99);
    assert_eq!(assumed_square_dimension(100, 95, 5), 97);
    assert_eq!(assumed_square_dimension(150, 150, 5), 150);
}

#[test]
fn distant_extents_take_the_larger() {
    assert_eq!(assumed_square_dimension(80, 100, 5), 100);
    assert_eq!(assumed_square_dimension(200, 94, 5), 200);
}

#[test]
fn extent_grows_in_steps_and_resets() {
    let mut e = ScanExtent::new(&ScanPolicy::default());
    assert_eq!(e.size(), 100);
    e.observe(60, 40);
    assert_eq!(e.size(), 100);
    e.observe(101, 3);
    assert_eq!(e.size(), 150);
    e.observe(10, 230);
    assert_eq!(e.size(), 250);
    e.reset();
    assert_eq!(e.size(), 100);
}

#[test]
fn extent_ignores_values_beyond_max() {
    let mut e = ScanExtent::new(&ScanPolicy::default());
    e.observe(5_000, 0);
    assert_eq!(e.size(), 100);
    e.observe(300, 0);
    assert_eq!(e.size(), 300);
}

#[test]
fn far_corner_must_cover_everything_seen() {
    let mut e = ScanExtent::new(&ScanPolicy::default());
    e.observe(100, 0);
    assert!(!e.is_far_corner(60, 1));
    assert!(e.is_far_corner(99, 1));
    assert!(e.is_far_corner(100, 1));
    e.reset();
    e.observe(50, 50);
    assert!(e.is_far_corner(50, 1));
}

#[test]
fn far_corner_limited_to_step_and_max() {
    let e = ScanExtent::new(&ScanPolicy::default());
    assert!(!e.is_far_corner(49, 1));
    assert!(e.is_far_corner(50, 1));
    assert!(e.is_far_corner(300, 1));
    assert!(!e.is_far_corner(301, 1));
}

#[test]
fn settle_takes_the_end_corner() {
    let mut e = ScanExtent::new(&ScanPolicy::default());
    e.settle(50);
    assert_eq!(e.size(), 50);
    e.settle(400);
    assert_eq!(e.size(), 300);
    e.reset();
    assert_eq!(e.size(), 100);
}

proptest! {
    #[test]
    fn extent_stays_a_bounded_step_multiple(points in proptest::collection::vec((0i32..400, 0i32..400), 0..50)) {
        let policy = ScanPolicy::default();
        let mut e = ScanExtent::new(&policy);
        let mut prev = e.size();
        for (x, y) in points {
            e.observe(x, y);
            prop_assert!(e.size() >= prev);
            prop_assert!(e.size() <= policy.max_extent);
            prop_assert_eq!(e.size() % policy.extent_step, 0);
            prev = e.size();
        }
    }
}
