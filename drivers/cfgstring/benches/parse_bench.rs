use std::fmt::Write;

use cfgstring::{ConfigText, FlatImage, ParserConfig, config_find_devices, config_string_u64};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// A platform in the shape early RISC-V boot ROMs handed to the kernel.
fn platform(harts: usize, uarts: usize) -> String {
    let mut text = String::from(
        "platform { vendor ucb; arch rocket; };\n\
         rtc { addr 0x2000; };\n\
         plic { interface \"plic\"; ndevs 31; priority { mem 0x40000000 0x40000fff; }; mem 0x40001000 0x40001fff; };\n",
    );
    text.push_str("core {\n");
    for hart in 0..harts {
        writeln!(
            text,
            "  {hart} {{ 0 {{ isa rv64imafdc; timecmp {:#x}; ipi {:#x}; plic {{ m {{ ie 0x40002000; thresh 0x40200000; claim 0x40200004; }}; }}; }}; }};",
            0x2004000 + hart * 8,
            0x2000000 + hart * 4,
        )
        .unwrap();
    }
    text.push_str("};\n");
    for uart in 0..uarts {
        writeln!(
            text,
            "uart{uart} {{ interface \"sifive,uart0\"; clock 50_000_000; irq {}; mem {:#x} {:#x}; }};",
            uart + 1,
            0x10013000 + uart * 0x1000,
            0x10013fff + uart * 0x1000,
        )
        .unwrap();
    }
    text
}

fn bench_find_devices(c: &mut Criterion) {
    let text = platform(4, 8);
    c.bench_function("find_devices_small_platform", |b| {
        b.iter(|| config_find_devices(black_box(text.as_bytes())))
    });

    let large = platform(64, 256);
    c.bench_function("find_devices_large_platform", |b| {
        b.iter(|| config_find_devices(black_box(large.as_bytes())))
    });
}

fn bench_lookup(c: &mut Criterion) {
    let text = platform(64, 16);
    let config = ConfigText::new(text.as_bytes());
    c.bench_function("lookup_last_hart", |b| {
        b.iter(|| config.u64(black_box("core.63.0.timecmp")))
    });

    let devices = config_find_devices(text.as_bytes());
    let uart = devices.last().unwrap();
    c.bench_function("device_attribute", |b| {
        b.iter(|| config_string_u64(uart, black_box("clock")))
    });
}

fn bench_flat_image(c: &mut Criterion) {
    let text = platform(16, 64);
    let config = ParserConfig::new();
    c.bench_function("flat_image_from_text", |b| {
        b.iter(|| FlatImage::from_text(black_box(text.as_bytes()), &config).unwrap())
    });
}

criterion_group!(benches, bench_find_devices, bench_lookup, bench_flat_image);
criterion_main!(benches);
