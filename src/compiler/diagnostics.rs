//! The diagnostic message catalog (spec §7, SPEC_FULL §2.1).
//!
//! Every subsystem (scanner, parser, environment, checker) reports through
//! this catalog instead of ad hoc strings, mirroring the teacher's
//! `diagnostics::UNTERMINATED_STRING_LITERAL_1002`-style numbered constants.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Suggestion,
    Message,
}

#[derive(Debug, Clone, Copy)]
pub struct Message {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub template: &'static str,
}

macro_rules! messages {
    ($($name:ident = ($code:expr, $category:expr, $template:expr);)*) => {
        $(pub const $name: Message = Message { code: $code, category: $category, template: $template };)*
    };
}

use DiagnosticCategory::*;

messages! {
    // Parse errors (1000-1999)
    UNTERMINATED_STRING_LITERAL_1002 = (1002, Error, "Unterminated string literal.");
    UNTERMINATED_TEMPLATE_LITERAL_1003 = (1003, Error, "Unterminated template literal.");
    UNEXPECTED_TOKEN_1004 = (1004, Error, "Unexpected token.");
    EXPECTED_TOKEN_1005 = (1005, Error, "Expected {0}.");
    TRAILING_COMMA_NOT_ALLOWED_1009 = (1009, Error, "Trailing comma not allowed.");
    REST_PARAMETER_MUST_BE_LAST_1014 = (1014, Error, "A rest parameter or binding pattern must be last in a parameter list.");
    REST_ELEMENT_MUST_BE_LAST_1257 = (1257, Error, "A rest element must be last in a tuple type.");
    CONST_DECLARATIONS_MUST_BE_INITIALIZED_1155 = (1155, Error, "'const' declarations must be initialized.");
    DEFINITE_ASSIGNMENT_REQUIRES_TYPE_1187 = (1187, Error, "A definite assignment assertion '!' is only allowed for a binding with a type annotation and no initializer.");
    ABSTRACT_MODIFIER_OUTSIDE_ABSTRACT_CLASS_1242 = (1242, Error, "'abstract' modifier can only appear on a class, method, or property declaration.");
    CONSTRUCTOR_CANNOT_BE_ABSTRACT_1243 = (1243, Error, "'abstract' modifier cannot be used with a constructor declaration.");
    STATIC_MODIFIER_CANNOT_BE_ABSTRACT_1244 = (1244, Error, "'abstract' modifier cannot be used with a static member.");
    PARAMETER_PROPERTY_OUTSIDE_CONSTRUCTOR_1187_2 = (1196, Error, "A parameter property is only allowed in a constructor implementation.");
    UNTERMINATED_REGEX_1161 = (1161, Error, "Unterminated regular expression literal.");
    DIGIT_EXPECTED_1124 = (1124, Error, "Digit expected.");

    // Name errors (2300-2399 range borrowed loosely)
    CANNOT_FIND_NAME_2304 = (2304, Error, "Cannot find name '{0}'.");
    DUPLICATE_IDENTIFIER_2300 = (2300, Error, "Duplicate identifier '{0}'.");
    DUPLICATE_LABEL_2195 = (2195, Error, "Duplicate label '{0}'.");
    LABEL_NOT_FOUND_2304 = (2304, Error, "Cannot find label '{0}'.");
    JUMP_TARGET_CANNOT_CROSS_FUNCTION_1107 = (1107, Error, "Jump target cannot cross function boundary.");

    // Type mismatch (2322 family, matches real TS numbering loosely)
    TYPE_NOT_ASSIGNABLE_2322 = (2322, Error, "Type '{0}' is not assignable to type '{1}'.");
    TYPE_X_NOT_ASSIGNABLE_TO_CONSTRAINT_2344 = (2344, Error, "Type '{0}' does not satisfy the constraint '{1}'.");

    // Arity/signature errors
    EXPECTED_N_ARGUMENTS_2554 = (2554, Error, "Expected {0} arguments, but got {1}.");
    PROPERTY_MISSING_2741 = (2741, Error, "Property '{0}' is missing in type '{1}' but required in type '{2}'.");
    OBJECT_LITERAL_MAY_ONLY_SPECIFY_KNOWN_PROPERTIES_2353 = (2353, Error, "Object literal may only specify known properties, and '{0}' does not exist in type '{1}'.");

    // Modifier/structural errors
    PRIVATE_ACCESS_2341 = (2341, Error, "Property '{0}' is private and only accessible within class '{1}'.");
    READONLY_ASSIGNMENT_2540 = (2540, Error, "Cannot assign to '{0}' because it is a read-only property.");

    // Internal
    INTERNAL_ERROR_9000 = (9000, Error, "Internal error: {0}.");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Parse,
    Name,
    Type,
    Import,
    Internal,
}
