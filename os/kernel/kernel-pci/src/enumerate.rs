use crate::header::ids_present;
use crate::{ClassTriple, ConfigSpace, EcamGroup, PciAddress, PciDeviceHeader};
use kernel_memory_addresses::PhysicalAddress;

/// How much of configuration space is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStrategy {
    /// A bus whose first function is absent is skipped, and so is a device
    /// whose function 0 is absent.
    #[default]
    LeadingFunction,
    /// Every bus is walked; a device whose function 0 is absent is skipped.
    PerDevice,
    /// Every function of every device on every bus is probed.
    Exhaustive,
}

impl ProbeStrategy {
    const fn gates_buses(self) -> bool {
        matches!(self, Self::LeadingFunction)
    }

    const fn gates_devices(self) -> bool {
        matches!(self, Self::LeadingFunction | Self::PerDevice)
    }
}

/// A present function found during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciFunction {
    pub address: PciAddress,
    /// Physical address of the configuration page (identity mapped).
    pub config: PhysicalAddress,
    pub header: PciDeviceHeader,
}

impl PciFunction {
    #[must_use]
    pub const fn class_triple(&self) -> ClassTriple {
        self.header.class_triple()
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Bus,
    Device,
    Function,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    group: EcamGroup,
    bus: u16,
    device: u8,
    function: u8,
    stage: Stage,
}

impl Cursor {
    const fn new(group: EcamGroup) -> Self {
        Self {
            group,
            bus: group.start_bus as u16,
            device: 0,
            function: 0,
            stage: Stage::Bus,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn address(&self) -> PciAddress {
        PciAddress::new(self.group.segment, self.bus as u8, self.device, self.function)
    }

    const fn page(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.group.base.as_u64() + self.address().ecam_offset())
    }

    const fn next_bus(&mut self) {
        self.bus += 1;
        self.device = 0;
        self.function = 0;
        self.stage = Stage::Bus;
    }

    const fn next_device(&mut self) {
        self.device += 1;
        self.function = 0;
        self.stage = Stage::Device;
    }
}

/// Lazy bus → device → function walk over a set of ECAM groups.
///
/// Yields `Ok` for every present function in ascending order. A mapping
/// failure is yielded once as `Err` and ends the walk.
pub struct Enumerator<'g, S> {
    space: S,
    groups: core::slice::Iter<'g, EcamGroup>,
    strategy: ProbeStrategy,
    cursor: Option<Cursor>,
    failed: bool,
}

impl<'g, S: ConfigSpace> Enumerator<'g, S> {
    pub fn new(space: S, groups: &'g [EcamGroup], strategy: ProbeStrategy) -> Self {
        Self {
            space,
            groups: groups.iter(),
            strategy,
            cursor: None,
            failed: false,
        }
    }
}

/// Map `page`, then read its ids.
fn probe<S: ConfigSpace>(space: &mut S, page: PhysicalAddress) -> Result<bool, S::Error> {
    space.map(page)?;
    let (vendor, device) = space.read_ids(page);
    Ok(ids_present(vendor, device))
}

impl<S: ConfigSpace> Iterator for Enumerator<'_, S> {
    type Item = Result<PciFunction, S::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let Some(cur) = self.cursor.as_mut() else {
                let group = *self.groups.next()?;
                log::debug!(
                    "ECAM segment {} at {}: buses {:#04x}..{:#04x}",
                    group.segment,
                    group.base,
                    group.start_bus,
                    group.end_bus
                );
                self.cursor = Some(Cursor::new(group));
                continue;
            };

            if cur.bus >= u16::from(cur.group.end_bus) {
                self.cursor = None;
                continue;
            }

            let page = cur.page();
            match cur.stage {
                Stage::Bus => {
                    if self.strategy.gates_buses() {
                        match probe(&mut self.space, page) {
                            Ok(true) => {}
                            Ok(false) => {
                                cur.next_bus();
                                continue;
                            }
                            Err(e) => {
                                self.failed = true;
                                return Some(Err(e));
                            }
                        }
                    }
                    cur.stage = Stage::Device;
                }
                Stage::Device => {
                    if cur.device >= PciAddress::DEVICES_PER_BUS {
                        cur.next_bus();
                        continue;
                    }
                    if self.strategy.gates_devices() {
                        match probe(&mut self.space, page) {
                            Ok(true) => {}
                            Ok(false) => {
                                cur.next_device();
                                continue;
                            }
                            Err(e) => {
                                self.failed = true;
                                return Some(Err(e));
                            }
                        }
                    }
                    cur.stage = Stage::Function;
                }
                Stage::Function => {
                    if cur.function >= PciAddress::FUNCTIONS_PER_DEVICE {
                        cur.next_device();
                        continue;
                    }
                    let address = cur.address();
                    cur.function += 1;
                    match probe(&mut self.space, page) {
                        Ok(true) => {
                            let header = self.space.read_header(page);
                            return Some(Ok(PciFunction {
                                address,
                                config: page,
                                header,
                            }));
                        }
                        Ok(false) => {}
                        Err(e) => {
                            self.failed = true;
                            return Some(Err(e));
                        }
                    }
                }
            }
        }
    }
}
