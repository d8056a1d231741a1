//! Line builders for generated function bodies.

/// Collects the statements of a native (C / Objective-C) function body.
#[derive(Debug, Default)]
pub struct NativeCodeBuilder {
    lines: Vec<String>,
}

impl NativeCodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn out(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Collects the statements of a managed function body.
///
/// Once a body needs temporary native memory it is wrapped in a single
/// `memScoped` block; statements emitted after that point are nested.
#[derive(Debug)]
pub struct ManagedCodeBuilder {
    scope: String,
    lines: Vec<String>,
    mem_scoped: bool,
}

impl ManagedCodeBuilder {
    /// A builder whose types render relative to `scope`.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            lines: Vec::new(),
            mem_scoped: false,
        }
    }

    /// Package that types are rendered relative to.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn out(&mut self, line: impl Into<String>) {
        let line = line.into();
        if self.mem_scoped {
            self.lines.push(format!("    {line}"));
        } else {
            self.lines.push(line);
        }
    }

    /// Open the `memScoped` block; later calls are no-ops.
    pub fn push_mem_scoped(&mut self) {
        if !self.mem_scoped {
            self.lines.push("memScoped {".to_string());
            self.mem_scoped = true;
        }
    }

    /// Native pointer to the nullable memory-backed value `name`, valid
    /// until the `memScoped` block closes.
    pub fn native_pointer(&mut self, name: &str) -> String {
        self.push_mem_scoped();
        format!("{name}?.getPointer(memScope)")
    }

    pub fn return_result(&mut self, expr: &str) {
        self.out(format!("return {expr}"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(mut self) -> Vec<String> {
        if self.mem_scoped {
            self.lines.push("}".to_string());
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_collect_in_order() {
        let mut native = NativeCodeBuilder::new();
        native.out("int x = p0;");
        native.out(String::from("x += 1;"));
        assert_eq!(native.into_lines(), vec!["int x = p0;", "x += 1;"]);

        let mut managed = ManagedCodeBuilder::new("platform.zlib");
        managed.out("val x = p0");
        managed.return_result("x + 1");
        assert_eq!(managed.scope(), "platform.zlib");
        assert_eq!(managed.lines(), ["val x = p0", "return x + 1"]);
    }

    #[test]
    fn mem_scoped_block_opens_once() {
        let mut managed = ManagedCodeBuilder::new("");
        managed.out("val n = 1");
        let pointer = managed.native_pointer("name?.cstr");
        managed.push_mem_scoped();
        managed.return_result(&format!("puts({pointer}.rawValue)"));
        assert_eq!(
            managed.into_lines(),
            vec![
                "val n = 1",
                "memScoped {",
                "    return puts(name?.cstr?.getPointer(memScope).rawValue)",
                "}",
            ]
        );
    }
}
