use cfgstring::{
    DeviceRegistry, ParserConfig, PlatformDevice, RecordingRegistry, RegistryError,
    RegistryResult, ResourceFlags, config_find_devices, config_register_devices,
};
use pretty_assertions::assert_eq;

const TEXT: &[u8] = br#"
    uart { interface "ns16550"; irq 3; };
    gpio { interface "sifive,gpio0"; mem 0x1000 0x1fff; };
    spi { interface "sifive,spi0"; };
"#;

#[test]
fn test_register_all_devices() {
    let mut registry = RecordingRegistry::new();
    let count = config_register_devices(TEXT, &ParserConfig::new(), &mut registry);

    assert_eq!(count, 3);
    let ids: Vec<_> = registry.devices().iter().map(|dev| dev.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);

    let uart = registry.get("uart").unwrap();
    assert_eq!(uart.driver_override, "ns16550");
    assert_eq!(uart.resources[0].flags, ResourceFlags::IRQ);
    assert_eq!(
        uart.config.as_deref(),
        Some(&br#" interface "ns16550"; irq 3; "#[..])
    );
}

#[test]
fn test_repeated_registration_gets_fresh_ids() {
    let mut registry = RecordingRegistry::new();
    config_register_devices(TEXT, &ParserConfig::new(), &mut registry);
    config_register_devices(TEXT, &ParserConfig::new(), &mut registry);
    assert_eq!(registry.devices().len(), 6);
    assert_eq!(registry.devices()[5].id, 5);
}

#[test]
fn test_fixed_id_registers_once() {
    let mut devices = config_find_devices(TEXT);
    devices[0].id = 7;

    let mut registry = RecordingRegistry::new();
    assert_eq!(registry.register(&devices[0]), Ok(()));
    assert_eq!(
        registry.register(&devices[0]),
        Err(RegistryError::AlreadyExists)
    );
    assert_eq!(registry.register(&devices[1]), Ok(()));
    assert_eq!(registry.get("uart").unwrap().id, 7);
}

/// Refuses one device by name and counts exposed configs.
struct Picky {
    refuse: &'static str,
    inner: RecordingRegistry,
    exposed: usize,
}

impl DeviceRegistry for Picky {
    fn register(&mut self, device: &PlatformDevice<'_>) -> RegistryResult {
        if device.name == self.refuse {
            return Err(RegistryError::Unsupported);
        }
        self.inner.register(device)
    }

    fn expose_config(&mut self, device: &PlatformDevice<'_>, raw: &[u8]) -> RegistryResult {
        self.exposed += 1;
        self.inner.expose_config(device, raw)
    }
}

#[test]
fn test_refused_device_is_skipped() {
    let mut registry = Picky {
        refuse: "gpio",
        inner: RecordingRegistry::new(),
        exposed: 0,
    };
    let count = config_register_devices(TEXT, &ParserConfig::new(), &mut registry);

    assert_eq!(count, 2);
    assert_eq!(registry.exposed, 2);
    let names: Vec<_> = registry
        .inner
        .devices()
        .iter()
        .map(|dev| dev.name.as_str())
        .collect();
    assert_eq!(names, vec!["uart", "spi"]);
}

#[test]
fn test_trait_object_registry() {
    let mut registry = RecordingRegistry::new();
    let dyn_registry: &mut dyn DeviceRegistry = &mut registry;
    assert_eq!(
        config_register_devices(TEXT, &ParserConfig::new(), dyn_registry),
        3
    );
}

#[test]
fn test_error_messages() {
    assert_eq!(RegistryError::AlreadyExists.to_string(), "Entity already exists");
    assert_eq!(RegistryError::NoMemory.message(), "Not enough memory");
}
