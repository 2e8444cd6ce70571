use super::*;
use crate::clock::SystemClock;
use crate::id::UlidIdGen;

#[test]
fn context_exposes_root_and_config() {
    let ctx = Context::new(
        "/tmp/lattice-project",
        Config::default(),
        Arc::new(SystemClock),
        Arc::new(UlidIdGen),
    );
    assert_eq!(ctx.root(), Path::new("/tmp/lattice-project"));
    assert_eq!(ctx.config().workflow.statuses.first().unwrap(), "backlog");
}
