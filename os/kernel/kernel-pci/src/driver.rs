use crate::{ClassTriple, PciAddress, PciFunction};
use alloc::boxed::Box;
use alloc::vec::Vec;

/// A driver instance bound to one PCI function.
pub trait PciDriver {
    fn name(&self) -> &'static str;

    /// The function this instance drives.
    fn address(&self) -> PciAddress;
}

type Constructor = Box<dyn Fn(&PciFunction) -> Box<dyn PciDriver>>;

/// Maps class triples to driver constructors.
#[derive(Default)]
pub struct DriverRegistry {
    entries: Vec<(ClassTriple, Constructor)>,
}

impl DriverRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `ctor` for functions whose class triple equals `class`.
    ///
    /// If two constructors claim the same triple, the first one registered wins.
    pub fn register<F>(&mut self, class: ClassTriple, ctor: F)
    where
        F: Fn(&PciFunction) -> Box<dyn PciDriver> + 'static,
    {
        self.entries.push((class, Box::new(ctor)));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Construct a driver for `function` if its class triple is registered.
    #[must_use]
    pub fn dispatch(&self, function: &PciFunction) -> Option<Box<dyn PciDriver>> {
        let triple = function.class_triple();
        let (_, ctor) = self.entries.iter().find(|(class, _)| *class == triple)?;
        Some(ctor(function))
    }
}
