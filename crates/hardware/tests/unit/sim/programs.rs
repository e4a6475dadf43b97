//! Whole-program simulation.
//!
//! Programs are assembled from text and run through the fetch frontend, including control flow
//! the core itself does not model (jumps at fetch, branches redirected at commit).

use pretty_assertions::assert_eq;
use tomasim_core::common::{Fault, SimError};
use tomasim_core::config::{Config, RstPolicy};
use tomasim_core::core::pipeline::supply::FetchState;
use tomasim_core::isa::assemble;
use tomasim_core::sim::{ExitStatus, Simulator};

use crate::common::init_logging;

fn simulator(src: &str, config: &Config) -> Simulator {
    init_logging();
    let program = assemble(src).unwrap();
    Simulator::new(config, &program).unwrap()
}

fn run(src: &str) -> (Simulator, Result<ExitStatus, SimError>) {
    let mut sim = simulator(src, &Config::default());
    let status = sim.run();
    (sim, status)
}

const SUM_LOOP: &str = "
        li   r1, 5
        li   r2, 0
    loop:
        add  r2, r2, r1
        addi r1, r1, -1
        bne  r1, r0, loop
        exit r2
";

// ══════════════════════════════════════════════════════════
// Control flow
// ══════════════════════════════════════════════════════════

#[test]
fn counted_loop_exits_with_sum() {
    let (sim, status) = run(SUM_LOOP);
    let status = status.unwrap();

    assert_eq!(status.code, 15);
    assert_eq!(status.retired, 18);
    assert_eq!(sim.cpu.regs.read(1), 0);
    assert_eq!(sim.cpu.stats.inst_branch, 5);
}

#[test]
fn wrong_path_is_never_issued() {
    let (sim, status) = run(SUM_LOOP);
    let _ = status.unwrap();
    // Fetch waits for every branch, so everything issued also retires.
    assert_eq!(sim.cpu.stats.instructions_issued, sim.cpu.committed);
}

#[test]
fn fetch_waits_on_unresolved_branch() {
    let mut sim = simulator(SUM_LOOP, &Config::default());
    while sim.frontend.state() != FetchState::AwaitBranch {
        let _ = sim.tick().unwrap();
    }
    // The branch is the last instruction fetched; nothing past it is queued.
    assert_eq!(sim.frontend.pc(), 5);
    let queued = sim.frontend.queued();
    let _ = sim.tick().unwrap();
    assert!(sim.frontend.queued() <= queued);
}

#[test]
fn jump_is_followed_at_fetch() {
    let (sim, status) = run("
            li   r1, 1
            j    skip
            li   r1, 99
        skip:
            exit r1
    ");
    assert_eq!(status.unwrap().code, 1);
    assert_eq!(sim.cpu.stats.inst_branch, 1);
}

#[test]
fn exit_stops_fetch() {
    let (sim, status) = run("
            exit
            li r1, 5
    ");
    let status = status.unwrap();
    assert_eq!(status.code, 0);
    assert_eq!(status.retired, 1);
    assert_eq!(sim.cpu.regs.read(1), 0);
    assert_eq!(sim.frontend.state(), FetchState::Stopped);
}

#[test]
fn running_off_the_end_exits_with_zero() {
    let (sim, status) = run("li r1, 3\nli r2, 4");
    let status = status.unwrap();
    assert_eq!(status.code, 0);
    assert_eq!(status.retired, 2);
    assert_eq!(sim.cpu.exit_code, None);
    assert!(sim.frontend.is_drained());
    assert_eq!(sim.cpu.regs.read(2), 4);
}

#[test]
fn cycle_limit_stops_endless_loop() {
    let mut config = Config::default();
    config.general.max_cycles = 100;
    let mut sim = simulator("spin: j spin", &config);

    match sim.run() {
        Err(SimError::CycleLimit(limit)) => assert_eq!(limit, 100),
        other => panic!("expected cycle limit, got {other:?}"),
    }
    assert_eq!(sim.cpu.stats.cycles, 100);
}

// ══════════════════════════════════════════════════════════
// Memory
// ══════════════════════════════════════════════════════════

#[test]
fn data_image_is_preloaded() {
    let (sim, status) = run("
        .word 0x10 3, 4
            lw  r1, 16(r0)
            lw  r2, 17(r0)
            mul r3, r1, r2
            sw  r3, 18(r0)
            exit r3
    ");
    assert_eq!(status.unwrap().code, 12);
    assert_eq!(sim.cpu.units.memory().read(18), Ok(12));
}

#[test]
fn out_of_range_load_faults_at_commit() {
    let (sim, status) = run("
            li r1, 1
            lw r2, 5000(r0)
            li r3, 1
    ");
    match status {
        Err(SimError::Fault { pc, fault }) => {
            assert_eq!(pc, 1);
            assert_eq!(fault, Fault::MemoryOutOfRange { addr: 5000 });
        }
        other => panic!("expected fault, got {other:?}"),
    }
    assert_eq!(sim.cpu.regs.read(1), 1);
    assert_eq!(sim.cpu.regs.read(3), 0);
}

// ══════════════════════════════════════════════════════════
// Construction
// ══════════════════════════════════════════════════════════

#[test]
fn register_beyond_core_is_rejected() {
    let mut config = Config::default();
    config.core.num_regs = 8;
    let program = assemble("li r9, 1").unwrap();
    assert!(matches!(
        Simulator::new(&config, &program),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn data_outside_memory_is_rejected() {
    let mut config = Config::default();
    config.memory.size_words = 16;
    let program = assemble(".word 16 1\nhalt").unwrap();
    assert!(matches!(
        Simulator::new(&config, &program),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = Config::default();
    config.core.rob_size = 0;
    let program = assemble("halt").unwrap();
    assert!(matches!(
        Simulator::new(&config, &program),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn tiny_machine_still_completes() {
    let mut config = Config::default();
    config.core.rs_size = 1;
    config.core.rob_size = 1;
    let mut sim = simulator(SUM_LOOP, &config);
    assert_eq!(sim.run().unwrap().code, 15);
    assert!(sim.cpu.stats.stalls_rs_full > 0);
}

#[test]
fn exit_status_serializes() {
    let (_, status) = run("li r1, 2\nexit r1");
    let status = status.unwrap();
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json["code"], 2);
    assert_eq!(json["retired"], 2);
    assert_eq!(json["cycles"], status.cycles);
}

// ══════════════════════════════════════════════════════════
// RST policy
// ══════════════════════════════════════════════════════════

const R0_ALIAS: &str = "
        li   r2, 36
        li   r3, 6
        li   r4, 40
        div  r0, r2, r3
        sw   r3, 0(r4)
        add  r8, r0, r0
        exit r8
";

fn with_policy(policy: RstPolicy) -> Config {
    let mut config = Config::default();
    config.core.rst_policy = policy;
    config
}

#[test]
fn always_policy_flags_register_shared_with_non_writers() {
    let program = assemble(R0_ALIAS).unwrap();
    let hazard = Simulator::rst_alias_hazard(&with_policy(RstPolicy::Always), &program).unwrap();
    assert_eq!(hazard.pc, 3);
    assert_eq!(hazard.rd, 0);
}

#[test]
fn default_policy_has_no_alias_hazard() {
    let program = assemble(R0_ALIAS).unwrap();
    assert!(Simulator::rst_alias_hazard(&Config::default(), &program).is_none());
}

#[test]
fn always_policy_without_r0_writer_is_not_flagged() {
    let program = assemble(SUM_LOOP).unwrap();
    assert!(Simulator::rst_alias_hazard(&with_policy(RstPolicy::Always), &program).is_none());
}

#[test]
fn default_policy_reads_r0_writer_correctly() {
    let mut sim = simulator(R0_ALIAS, &Config::default());
    assert_eq!(sim.run().unwrap().code, 12);
    assert_eq!(sim.cpu.regs.read(0), 6);
}

// ══════════════════════════════════════════════════════════
// Bundled programs
// ══════════════════════════════════════════════════════════

#[rstest::rstest]
#[case("sum.s", 55)]
#[case("fib.s", 109)]
#[case("dot.s", 70)]
fn bundled_program_exit_codes(#[case] name: &str, #[case] code: u32) {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../programs");
    let src = std::fs::read_to_string(dir.join(name)).unwrap();
    for config in [
        Config::default(),
        Config::from_file(dir.join("small.json")).unwrap(),
    ] {
        let mut sim = simulator(&src, &config);
        assert_eq!(sim.run().unwrap().code, code, "{name}");
    }
}
