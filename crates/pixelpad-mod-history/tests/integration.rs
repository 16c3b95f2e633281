// Integration tests for the history system.
//
// These tests drive the HistoryLedger against real in-memory surfaces,
// simulating the way an editor session issues adjustments.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pixelpad_mod_history::{
    Adjustment, EffectStep, HistoryConfig, HistoryLedger, LeafOperation, MemorySurface, Operation,
    OperationKind, PixelBuffer, Region, SharedSurface,
};

const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Brightness adds the delta, RGB shift adds per channel. Both clamp.
fn offset(input: &PixelBuffer, adjustment: &Adjustment) -> anyhow::Result<PixelBuffer> {
    let deltas = match *adjustment {
        Adjustment::Brightness { delta } => [delta; 3],
        Adjustment::RgbShift { red, green, blue } => [red, green, blue],
        _ => anyhow::bail!("unsupported adjustment {adjustment:?}"),
    };
    let mut out = input.clone();
    for px in out.pixels_mut() {
        for (c, d) in px.iter_mut().zip(deltas) {
            *c = (i16::from(*c) + d).clamp(0, 255) as u8;
        }
    }
    Ok(out)
}

fn canvas(width: u32, height: u32) -> (Rc<RefCell<MemorySurface>>, SharedSurface) {
    let canvas = MemorySurface::filled(width, height, WHITE).into_shared();
    let shared: SharedSurface = canvas.clone();
    (canvas, shared)
}

fn adjust(surface: &SharedSurface, adjustment: Adjustment) -> Operation {
    let (w, h) = surface.borrow().dimensions();
    LeafOperation::new(
        adjustment.label(),
        surface,
        Region::full(w, h),
        EffectStep::new(adjustment, offset),
    )
    .into()
}

fn all(canvas: &Rc<RefCell<MemorySurface>>, rgba: [u8; 4]) -> bool {
    canvas.borrow().buffer().pixels().all(|p| p == rgba)
}

// ── Concrete scenario ──────────────────────────────────────────────────

#[test]
fn test_brightness_down_undo_redo_on_white_2x2() {
    let (canvas, shared) = canvas(2, 2);
    let mut ledger = HistoryLedger::default();

    ledger
        .execute(adjust(&shared, Adjustment::Brightness { delta: -50 }))
        .unwrap();
    assert_eq!(
        canvas.borrow().buffer().as_bytes(),
        [205u8, 205, 205, 255].repeat(4).as_slice()
    );

    assert!(ledger.undo().unwrap());
    assert_eq!(
        canvas.borrow().buffer().as_bytes(),
        WHITE.repeat(4).as_slice()
    );

    assert!(ledger.redo().unwrap());
    assert_eq!(
        canvas.borrow().buffer().as_bytes(),
        [205u8, 205, 205, 255].repeat(4).as_slice()
    );
}

// ── Full workflow ──────────────────────────────────────────────────────

#[test]
fn test_full_workflow_execute_undo_branch_redo() {
    let (canvas, shared) = canvas(3, 3);
    let mut ledger = HistoryLedger::new(HistoryConfig::without_merging());

    for _ in 0..10 {
        ledger
            .execute(adjust(&shared, Adjustment::Brightness { delta: -10 }))
            .unwrap();
    }
    assert!(all(&canvas, [155, 155, 155, 255]));

    for _ in 0..4 {
        assert!(ledger.undo().unwrap());
    }
    assert!(all(&canvas, [195, 195, 195, 255]));
    assert_eq!(ledger.state().entry_count, 10);

    // New branch drops the four undone entries.
    ledger
        .execute(adjust(
            &shared,
            Adjustment::RgbShift {
                red: 0,
                green: -100,
                blue: 0,
            },
        ))
        .unwrap();
    assert_eq!(ledger.state().entry_count, 7);
    assert!(!ledger.can_redo());
    assert!(all(&canvas, [195, 95, 195, 255]));

    while ledger.undo().unwrap() {}
    assert!(all(&canvas, WHITE));

    while ledger.redo().unwrap() {}
    assert!(all(&canvas, [195, 95, 195, 255]));
}

// ── Merging ────────────────────────────────────────────────────────────

#[test]
fn test_slider_ticks_merge_into_one_step() {
    let (canvas, shared) = canvas(2, 2);
    let mut ledger = HistoryLedger::default();
    let t0 = Instant::now();

    ledger
        .execute(adjust(&shared, Adjustment::Brightness { delta: -20 }).with_created_at(t0))
        .unwrap();
    ledger
        .execute(
            adjust(&shared, Adjustment::Brightness { delta: -30 })
                .with_created_at(t0 + Duration::from_millis(200)),
        )
        .unwrap();
    assert_eq!(ledger.state().entry_count, 1);

    let summary = &ledger.summaries()[0];
    assert_eq!(summary.params["steps"].as_array().map(Vec::len), Some(2));

    ledger.undo().unwrap();
    assert!(all(&canvas, WHITE));
    assert!(!ledger.can_undo());
}

#[test]
fn test_slow_adjustments_stay_separate() {
    let (canvas, shared) = canvas(2, 2);
    let mut ledger = HistoryLedger::default();
    let t0 = Instant::now();

    ledger
        .execute(adjust(&shared, Adjustment::Brightness { delta: -20 }).with_created_at(t0))
        .unwrap();
    ledger
        .execute(
            adjust(&shared, Adjustment::Brightness { delta: -30 })
                .with_created_at(t0 + Duration::from_millis(2000)),
        )
        .unwrap();
    assert_eq!(ledger.state().entry_count, 2);

    ledger.undo().unwrap();
    assert!(all(&canvas, [235, 235, 235, 255]));
    ledger.undo().unwrap();
    assert!(all(&canvas, WHITE));
}

// ── Grouping ───────────────────────────────────────────────────────────

#[test]
fn test_group_reverts_in_one_call() {
    let (canvas, shared) = canvas(2, 2);
    let mut ledger = HistoryLedger::new(HistoryConfig::without_merging());

    ledger.start_grouping("batch");
    ledger
        .execute(adjust(&shared, Adjustment::Brightness { delta: -40 }))
        .unwrap();
    ledger
        .execute(adjust(
            &shared,
            Adjustment::RgbShift {
                red: -15,
                green: 0,
                blue: 0,
            },
        ))
        .unwrap();
    ledger.end_grouping();

    assert_eq!(ledger.state().entry_count, 1);
    assert!(all(&canvas, [200, 215, 215, 255]));

    ledger.undo().unwrap();
    assert!(all(&canvas, WHITE));

    let summaries = ledger.summaries();
    assert_eq!(summaries[0].kind, OperationKind::Group);
    assert_eq!(summaries[0].children.len(), 2);
}

// ── Memory pressure ────────────────────────────────────────────────────

#[test]
fn test_large_surface_eviction_respects_ceiling() {
    let (canvas, shared) = canvas(64, 64);
    // Each leaf keeps two 16 KiB snapshots; allow roughly three of them.
    let config = HistoryConfig {
        merge_window_ms: 0,
        footprint_ceiling_bytes: 3 * 2 * 64 * 64 * 4 + 3 * 1024,
        retain_minimum: 1,
        max_entries: 1000,
    };
    let mut ledger = HistoryLedger::new(config.clone());

    for _ in 0..20 {
        ledger
            .execute(adjust(&shared, Adjustment::Brightness { delta: -1 }))
            .unwrap();
        assert!(ledger.state().total_footprint_bytes <= config.footprint_ceiling_bytes);
    }
    assert_eq!(ledger.state().entry_count, 3);

    while ledger.undo().unwrap() {}
    // Only the last three steps can be undone.
    assert!(all(&canvas, [238, 238, 238, 255]));
}

#[test]
fn test_floor_survives_tiny_ceiling() {
    let (canvas, shared) = canvas(8, 8);
    let config = HistoryConfig {
        footprint_ceiling_bytes: 16,
        retain_minimum: 1,
        ..HistoryConfig::without_merging()
    };
    let mut ledger = HistoryLedger::new(config);

    for _ in 0..3 {
        ledger
            .execute(adjust(&shared, Adjustment::Brightness { delta: -5 }))
            .unwrap();
        assert!(ledger.can_undo());
    }
    assert!(ledger.undo().unwrap());
    assert!(all(&canvas, [245, 245, 245, 255]));
}

// ── Isolation ──────────────────────────────────────────────────────────

#[test]
fn test_independent_ledgers_per_surface() {
    let (canvas_a, shared_a) = canvas(2, 2);
    let (canvas_b, shared_b) = canvas(2, 2);
    let mut ledger_a = HistoryLedger::default();
    let mut ledger_b = HistoryLedger::default();

    ledger_a
        .execute(adjust(&shared_a, Adjustment::Brightness { delta: -100 }))
        .unwrap();
    ledger_b
        .execute(adjust(&shared_b, Adjustment::Brightness { delta: -1 }))
        .unwrap();

    ledger_a.undo().unwrap();
    assert!(all(&canvas_a, WHITE));
    assert!(all(&canvas_b, [254, 254, 254, 255]));
}

#[test]
fn test_sub_region_edit_leaves_rest_alone() {
    let (canvas, shared) = canvas(4, 4);
    let mut ledger = HistoryLedger::default();
    let op = LeafOperation::new(
        "Brightness",
        &shared,
        Region::new(1, 1, 2, 2),
        EffectStep::new(Adjustment::Brightness { delta: -55 }, offset),
    );
    ledger.execute(op.into()).unwrap();

    {
        let surface = canvas.borrow();
        let buf = surface.buffer();
        assert_eq!(buf.pixel(0, 0), Some(WHITE));
        assert_eq!(buf.pixel(1, 1), Some([200, 200, 200, 255]));
        assert_eq!(buf.pixel(2, 2), Some([200, 200, 200, 255]));
        assert_eq!(buf.pixel(3, 3), Some(WHITE));
    }

    ledger.undo().unwrap();
    assert!(all(&canvas, WHITE));
}

#[test]
fn test_summaries_serialize_to_json() {
    let (_canvas, shared) = canvas(1, 1);
    let mut ledger = HistoryLedger::default();
    ledger
        .execute(adjust(&shared, Adjustment::Brightness { delta: -1 }))
        .unwrap();
    ledger.execute(Operation::no_op("Marker")).unwrap();

    let json = serde_json::to_string(&ledger.summaries()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["kind"], "leaf");
    assert_eq!(value[0]["params"]["steps"][0]["effect"], "brightness");
    assert_eq!(value[1]["kind"], "no_op");
    assert_eq!(value[1]["label"], "Marker");
}
