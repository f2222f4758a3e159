//! Well-known attribute keys stored in node and edge property maps.

/// `Bool`: declared `virtual`
pub const IS_VIRTUAL: &str = "is_virtual";
/// `Bool`: marked `override` or `final`
pub const IS_OVERRIDE: &str = "is_override";
/// `Bool`: pure virtual (`= 0`)
pub const IS_PURE: &str = "is_pure";
/// `Bool`: `static` member or internal-linkage function
pub const IS_STATIC: &str = "is_static";
/// `Bool`: `const`-qualified member function
pub const CONST_QUALIFIED: &str = "const_qualified";
/// `Bool`: `= default`
pub const IS_DEFAULTED: &str = "is_defaulted";
/// `Bool`: `= delete`
pub const IS_DELETED: &str = "is_deleted";
/// `Bool`: C-style variadic parameter list
pub const IS_VARIADIC: &str = "is_variadic";
/// `Bool`: the node carries a definition (body or record body)
pub const IS_DEFINITION: &str = "is_definition";
/// `Bool`: scope created from a qualifier only, never declared explicitly
pub const IMPLIED: &str = "implied";
/// `Bool`: declared as `struct` (kept on classes after a `struct` forward declaration merges)
pub const IS_STRUCT: &str = "is_struct";

/// `StringList`: normalized parameter type spellings
pub const PARAMETER_TYPES: &str = "parameter_types";
/// `StringList`: parameter names (empty string when unnamed)
pub const PARAMETER_NAMES: &str = "parameter_names";
/// `String`: normalized return type spelling
pub const RETURN_TYPE: &str = "return_type";
/// `Int`: number of parameters without default argument
pub const MIN_ARITY: &str = "min_arity";
/// `String`: spelled target of a type alias
pub const UNDERLYING_TYPE: &str = "underlying_type";
/// `String`: spelled type of a data member
pub const FIELD_TYPE: &str = "field_type";
/// `String`: `public`, `protected` or `private`
pub const ACCESS: &str = "access";
/// `StringList`: spelled base classes
pub const BASES: &str = "bases";
/// `StringList`: simple names of the member functions of a record
pub const METHODS: &str = "methods";
/// `StringList`: template parameter names
pub const TEMPLATE_PARAMETERS: &str = "template_parameters";

/// `String`: file of the winning declaration
pub const SOURCE_FILE: &str = "source_file";
/// `Int`: 1-based line of the winning declaration
pub const LINE: &str = "line";
/// `StringList`: every file that declares the entity
pub const DECLARED_IN: &str = "declared_in";
/// `String`: file that holds the definition
pub const DEFINED_IN: &str = "defined_in";

/// Edge `StringList`: why a UsesType edge exists (`parameter`, `return`, `field`, `local`, `alias`)
pub const ROLES: &str = "roles";
/// Edge `IntList`: lines of the call sites behind a Calls edge
pub const CALL_LINES: &str = "call_lines";
/// Edge `String`: access specifier of an inheritance
pub const INHERITANCE_ACCESS: &str = "inheritance_access";
/// Edge `StringList`: data members behind a HasField edge
pub const VIA_FIELDS: &str = "via_fields";

/// Attribute keys that are unioned on merge rather than overwritten.
pub const UNION_KEYS: [&str; 2] = [DECLARED_IN, METHODS];
