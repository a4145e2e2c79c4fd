//! The parts of a generated type and the files they land in.

use bitflags::bitflags;

use interop_core::Codespace;

/// One section of generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberComponent {
    /// Free declarations included ahead of the class, `{Name}.functions.h`.
    NativeFunctionDeclaration,
    /// The native class body, `{Name}.h`.
    NativeClassDeclaration,
    /// Native definitions, `{Name}.cpp`.
    NativeImplementation,
    /// The managed declaration, `{Name}.cs`.
    ManagedPart,
    /// A file with its own layout and path.
    Custom,
}

impl MemberComponent {
    pub const ALL: [MemberComponent; 5] = [
        MemberComponent::ManagedPart,
        MemberComponent::NativeFunctionDeclaration,
        MemberComponent::NativeClassDeclaration,
        MemberComponent::NativeImplementation,
        MemberComponent::Custom,
    ];

    /// Codespace the component is written in. Custom files live with native sources.
    pub const fn space(self) -> Codespace {
        match self {
            MemberComponent::ManagedPart => Codespace::Managed,
            _ => Codespace::Native,
        }
    }

    pub const fn flag(self) -> ComponentFlags {
        match self {
            MemberComponent::NativeFunctionDeclaration => ComponentFlags::NATIVE_FUNCTION_DECLARATION,
            MemberComponent::NativeClassDeclaration => ComponentFlags::NATIVE_CLASS_DECLARATION,
            MemberComponent::NativeImplementation => ComponentFlags::NATIVE_IMPLEMENTATION,
            MemberComponent::ManagedPart => ComponentFlags::MANAGED_PART,
            MemberComponent::Custom => ComponentFlags::CUSTOM,
        }
    }

    /// Native files go below `Public/` unless they only hold definitions.
    pub const fn is_public(self) -> bool {
        !matches!(self, MemberComponent::NativeImplementation)
    }
}

bitflags! {
    /// A set of [`MemberComponent`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentFlags: u8 {
        const NATIVE_FUNCTION_DECLARATION = 1 << 0;
        const NATIVE_CLASS_DECLARATION = 1 << 1;
        const NATIVE_IMPLEMENTATION = 1 << 2;
        const MANAGED_PART = 1 << 3;
        const CUSTOM = 1 << 4;

        /// Every component with a fixed layout.
        const ALL = Self::NATIVE_FUNCTION_DECLARATION.bits()
            | Self::NATIVE_CLASS_DECLARATION.bits()
            | Self::NATIVE_IMPLEMENTATION.bits()
            | Self::MANAGED_PART.bits();
    }
}

impl ComponentFlags {
    pub fn has(self, component: MemberComponent) -> bool {
        self.contains(component.flag())
    }

    /// The components in the set, managed part first.
    pub fn components(self) -> impl Iterator<Item = MemberComponent> {
        MemberComponent::ALL.into_iter().filter(move |c| self.has(*c))
    }
}

impl From<MemberComponent> for ComponentFlags {
    fn from(component: MemberComponent) -> Self {
        component.flag()
    }
}
