/// A contract a registered component may implement.
///
/// Capabilities drive both discovery (which names a phase looks up) and
/// ordering (which priority class a hook lands in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Capability {
    /// Observes and adjusts the finalized definition set.
    FactoryPostProcessor,
    /// Mutates the definition registry directly; implies `FactoryPostProcessor`.
    RegistryPostProcessor,
    /// Intercepts every component instance around initialization.
    InstancePostProcessor,
    /// Sees merged definitions before instantiation; implies `InstancePostProcessor`.
    MergedDefinitionPostProcessor,
    /// Carries an explicit order key.
    Ordered,
    /// Top-priority ordering; implies `Ordered`.
    PriorityOrdered,
    /// Receives context events.
    EventListener,
    /// Receives the context environment.
    EnvironmentAware,
    /// Receives the context event publisher.
    EventPublisherAware,
}

bitflags::bitflags! {
    /// A set of component capabilities.
    ///
    /// Sub-capabilities include the bits of the capability they extend, so a
    /// set containing `REGISTRY_POST_PROCESSOR` also contains
    /// `FACTORY_POST_PROCESSOR`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CapabilitySet: u32 {
        const FACTORY_POST_PROCESSOR = 1 << 0;
        const REGISTRY_POST_PROCESSOR = Self::FACTORY_POST_PROCESSOR.bits() | 1 << 1;
        const INSTANCE_POST_PROCESSOR = 1 << 2;
        const MERGED_DEFINITION_POST_PROCESSOR = Self::INSTANCE_POST_PROCESSOR.bits() | 1 << 3;
        const ORDERED = 1 << 4;
        const PRIORITY_ORDERED = Self::ORDERED.bits() | 1 << 5;
        const EVENT_LISTENER = 1 << 6;
        const ENVIRONMENT_AWARE = 1 << 7;
        const EVENT_PUBLISHER_AWARE = 1 << 8;
    }
}

impl Capability {
    /// Returns the bitflags for this capability, including implied ones.
    pub const fn as_set(self) -> CapabilitySet {
        match self {
            Self::FactoryPostProcessor => CapabilitySet::FACTORY_POST_PROCESSOR,
            Self::RegistryPostProcessor => CapabilitySet::REGISTRY_POST_PROCESSOR,
            Self::InstancePostProcessor => CapabilitySet::INSTANCE_POST_PROCESSOR,
            Self::MergedDefinitionPostProcessor => CapabilitySet::MERGED_DEFINITION_POST_PROCESSOR,
            Self::Ordered => CapabilitySet::ORDERED,
            Self::PriorityOrdered => CapabilitySet::PRIORITY_ORDERED,
            Self::EventListener => CapabilitySet::EVENT_LISTENER,
            Self::EnvironmentAware => CapabilitySet::ENVIRONMENT_AWARE,
            Self::EventPublisherAware => CapabilitySet::EVENT_PUBLISHER_AWARE,
        }
    }
}

impl From<Capability> for CapabilitySet {
    fn from(cap: Capability) -> Self {
        cap.as_set()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for cap in iter {
            set |= cap.as_set();
        }
        set
    }
}

impl CapabilitySet {
    pub fn provides(self, capability: Capability) -> bool {
        self.contains(capability.as_set())
    }
}
