use broadside::init_logging;
use log::LevelFilter;

#[test]
fn test_explicit_level_wins() {
    init_logging(Some(LevelFilter::Debug));
    assert_eq!(log::max_level(), LevelFilter::Debug);
    log::debug!("logger installed");

    // A second install is a no-op.
    init_logging(Some(LevelFilter::Error));
    assert_eq!(log::max_level(), LevelFilter::Debug);
}
