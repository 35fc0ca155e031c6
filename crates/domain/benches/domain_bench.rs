use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    OrderEvent, OrderStateContext, OrderStateMachine, OrderStatus, PaymentEvent,
    PaymentStateContext, PaymentStateMachine, PaymentStatus, StateMachine,
};

fn bench_order_send_event(c: &mut Criterion) {
    let machine = OrderStateMachine::new();

    c.bench_function("domain/order_send_event", |b| {
        b.iter(|| {
            let mut ctx = OrderStateContext::new("order-bench", OrderStatus::PendingPayment);
            machine
                .send_event(OrderStatus::PendingPayment, OrderEvent::Paid, &mut ctx)
                .unwrap()
        });
    });
}

fn bench_rejected_event(c: &mut Criterion) {
    let machine = PaymentStateMachine::new();

    c.bench_function("domain/payment_rejected_event", |b| {
        b.iter(|| {
            let mut ctx = PaymentStateContext::new("pay-bench", PaymentStatus::Refunded);
            machine
                .send_event(PaymentStatus::Refunded, PaymentEvent::Process, &mut ctx)
                .unwrap_err()
        });
    });
}

fn bench_possible_next_states(c: &mut Criterion) {
    let machine = PaymentStateMachine::new();

    c.bench_function("domain/payment_possible_next_states", |b| {
        b.iter(|| machine.possible_next_states(PaymentStatus::Processing));
    });
}

criterion_group!(
    benches,
    bench_order_send_event,
    bench_rejected_event,
    bench_possible_next_states
);
criterion_main!(benches);
