macro_rules! quedist_message {
    ( $( $arg:tt )* ) => {
        {
            format!(
                "[{}]  {}",
                "quedist".bold().italic().truecolor(135, 175, 255),
                format!($( $arg )*)
            )
        }
    }
}

macro_rules! debug_message {
    ( $( $arg:tt )* ) => {
        {
            quedist_message!(
                "{}",
                format!("DEBUG: {}", format!($( $arg )*)).dimmed()
            )
        }
    }
}

macro_rules! info_message {
    ( $( $arg:tt )* ) => {
        {
            quedist_message!(
                "{}",
                format!("{}", format!($( $arg )*)).bold()
            )
        }
    }
}

macro_rules! warning_message {
    ( $( $arg:tt )* ) => {
        {
            quedist_message!(
                "{}",
                format!("WARNING: {}", format!($( $arg )*)).bold().yellow()
            )
        }
    }
}

macro_rules! error_message {
    ( $file:expr, $line:expr, $message:expr ) => {{
        quedist_message!(
            "{}\n        ↳ in {}:{}",
            format!("ERROR: {}", $message).bold().red(),
            $file,
            $line
        )
    }};
}

macro_rules! println_info {
    ( $( $arg:tt )* ) => {
        {
            eprintln!("{}", info_message!($( $arg )*))
        }
    }
}

macro_rules! println_debug {
    ( $( $arg:tt )* ) => {
        {
            eprintln!("{}", debug_message!($( $arg )*))
        }
    }
}

macro_rules! println_warning {
    ( $( $arg:tt )* ) => {
        {
            eprintln!("{}", warning_message!($( $arg )*))
        }
    }
}

macro_rules! println_error {
    ( $error:expr ) => {{
        eprintln!(
            "{}",
            error_message!($error.file, $error.line, $error.message)
        )
    }};
}
