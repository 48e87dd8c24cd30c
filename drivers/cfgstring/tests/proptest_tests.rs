//! Property tests: whatever the input, measuring and materializing agree.

use std::fmt::Write;

use cfgstring::{FlatImage, FlatLayout, ParserConfig, config_find_devices, find_key};
use proptest::{collection::vec, prelude::*};

#[derive(Debug, Clone)]
struct DeviceDesc {
    name: String,
    driver: String,
    irqs: Vec<u32>,
    mems: Vec<(u32, u32)>,
}

fn device_desc() -> impl Strategy<Value = DeviceDesc> {
    (
        "[a-z]{1,6}",
        "[a-z0-9,]{1,12}",
        vec(any::<u32>(), 0..4),
        vec((any::<u32>(), any::<u32>()), 0..3),
    )
        .prop_map(|(name, driver, irqs, mems)| DeviceDesc {
            name: format!("d{name}"),
            driver,
            irqs,
            mems,
        })
}

fn render(descs: &[DeviceDesc]) -> String {
    let mut text = String::new();
    for desc in descs {
        writeln!(text, "{} {{", desc.name).unwrap();
        for irq in &desc.irqs {
            writeln!(text, "  irq {};", irq).unwrap();
        }
        writeln!(text, "  interface \"{}\";", desc.driver).unwrap();
        for (start, end) in &desc.mems {
            writeln!(text, "  mem {:#x} {:#x};", start, end).unwrap();
        }
        writeln!(text, "}};").unwrap();
    }
    text
}

proptest! {
    #[test]
    fn counts_match_rendered_devices(descs in vec(device_desc(), 0..8)) {
        let text = render(&descs);
        let devices = config_find_devices(text.as_bytes());

        prop_assert_eq!(devices.len(), descs.len());
        for (dev, desc) in devices.iter().zip(&descs) {
            prop_assert_eq!(&dev.name, &desc.name);
            prop_assert_eq!(dev.driver_override.as_deref(), Some(desc.driver.as_str()));
            prop_assert_eq!(dev.num_resources(), desc.irqs.len() + desc.mems.len());
        }
    }

    #[test]
    fn measured_counts_match_materialized(descs in vec(device_desc(), 0..8)) {
        let text = render(&descs);
        let config = ParserConfig::new();
        let devices = config_find_devices(text.as_bytes());
        let layout = FlatLayout::measure(&devices, &config).unwrap();
        let image = FlatImage::build(&devices, &config).unwrap();
        let read = image.devices().unwrap();

        prop_assert_eq!(layout.num_devices(), read.len());
        prop_assert_eq!(image.len() % config.page_size, 0);
        for ((dev, flat), count) in devices.iter().zip(&read).zip(&layout.resource_counts) {
            prop_assert_eq!(flat.resources.len(), *count);
            prop_assert_eq!(flat.name, dev.name.as_str());
            for (res, flat_res) in dev.resources.iter().zip(&flat.resources) {
                prop_assert_eq!((res.start, res.end), (flat_res.start, flat_res.end));
                prop_assert_eq!(res.flags, flat_res.flags);
            }
        }
    }

    #[test]
    fn arbitrary_input_never_panics(bytes in vec(any::<u8>(), 0..512)) {
        let devices = config_find_devices(&bytes);
        for dev in &devices {
            prop_assert!(dev.config.end <= bytes.len());
            let _ = dev.u64("irq");
            let _ = dev.string("interface");
        }
        let end = find_key(&bytes, 0, bytes.len(), "a.b", true);
        prop_assert!(end <= bytes.len());
        prop_assert!(FlatImage::build(&devices, &ParserConfig::new()).is_ok());
    }

    #[test]
    fn deep_nesting_is_bounded(depth in 1usize..400) {
        let text = format!("{}x {{ interface \"y\"; }}{}", "a { ".repeat(depth), "}".repeat(depth));
        let devices = config_find_devices(text.as_bytes());
        prop_assert!(devices.len() <= 1);
    }
}
