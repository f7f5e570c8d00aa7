// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drives the full recognizer pipeline with a scripted pointer stream and
//! prints every gesture the arena's winners emit.
//!
//! Run with `cargo run -p canopy_demos --example gesture_arbitration`.

use std::cell::RefCell;
use std::num::NonZeroU64;
use std::rc::Rc;

use canopy_gesture::{
    DragGestureRecognizer, GestureDispatcher, GestureEvent, GesturePointerAction,
    GesturePointerEvent, LongPressGestureRecognizer, PointerId, ScaleGestureRecognizer,
    TapGestureRecognizer,
};
use kurbo::Point;

fn pointer(n: u64) -> PointerId {
    NonZeroU64::new(n).unwrap()
}

fn event(
    pointer_id: PointerId,
    action: GesturePointerAction,
    x: f64,
    y: f64,
    timestamp: u64,
) -> GesturePointerEvent {
    GesturePointerEvent {
        pointer_id,
        action,
        position: Point::new(x, y),
        timestamp,
        is_primary: pointer_id.get() == 1,
    }
}

fn sink(log: &Rc<RefCell<Vec<(&'static str, GestureEvent)>>>, name: &'static str) -> impl FnMut(GestureEvent) + use<> {
    let log = log.clone();
    move |gesture| log.borrow_mut().push((name, gesture))
}

fn main() {
    let log: Rc<RefCell<Vec<(&'static str, GestureEvent)>>> = Rc::new(RefCell::new(Vec::new()));

    let mut dispatcher = GestureDispatcher::new();
    dispatcher.register(Box::new(TapGestureRecognizer::new(sink(&log, "tap"))));
    dispatcher.register(Box::new(LongPressGestureRecognizer::new(sink(
        &log,
        "long-press",
    ))));
    dispatcher.register(Box::new(DragGestureRecognizer::new(sink(&log, "drag"))));
    dispatcher.register(Box::new(ScaleGestureRecognizer::new(sink(&log, "scale"))));

    let p1 = pointer(1);
    let p2 = pointer(2);

    println!("== quick tap ==");
    dispatcher.handle_pointer_event(&event(p1, GesturePointerAction::Down, 40.0, 40.0, 0));
    dispatcher.handle_pointer_event(&event(p1, GesturePointerAction::Up, 41.0, 40.0, 60));
    report(&log);

    println!("== long press ==");
    dispatcher.handle_pointer_event(&event(p1, GesturePointerAction::Down, 40.0, 40.0, 1000));
    while let Some(deadline) = dispatcher.next_deadline() {
        // A real embedding arms a timer; the script just advances the clock.
        dispatcher.fire_deadlines(deadline);
    }
    dispatcher.handle_pointer_event(&event(p1, GesturePointerAction::Up, 40.0, 40.0, 1700));
    report(&log);

    println!("== drag with a fling ==");
    dispatcher.handle_pointer_event(&event(p1, GesturePointerAction::Down, 0.0, 100.0, 2000));
    for step in 1..=6u64 {
        dispatcher.handle_pointer_event(&event(
            p1,
            GesturePointerAction::Move,
            step as f64 * 30.0,
            100.0,
            2000 + step * 16,
        ));
    }
    dispatcher.handle_pointer_event(&event(p1, GesturePointerAction::Up, 180.0, 100.0, 2100));
    report(&log);

    println!("== two-finger pinch ==");
    dispatcher.handle_pointer_event(&event(p1, GesturePointerAction::Down, 100.0, 200.0, 3000));
    dispatcher.handle_pointer_event(&event(p2, GesturePointerAction::Down, 200.0, 200.0, 3005));
    for step in 1..=4u64 {
        dispatcher.handle_pointer_event(&event(
            p2,
            GesturePointerAction::Move,
            200.0 + step as f64 * 15.0,
            200.0,
            3005 + step * 16,
        ));
    }
    dispatcher.handle_pointer_event(&event(p2, GesturePointerAction::Up, 260.0, 200.0, 3080));
    dispatcher.handle_pointer_event(&event(p1, GesturePointerAction::Up, 100.0, 200.0, 3100));
    report(&log);
}

fn report(log: &Rc<RefCell<Vec<(&'static str, GestureEvent)>>>) {
    for (name, gesture) in log.borrow_mut().drain(..) {
        println!("  [{name}] {gesture:?}");
    }
}
