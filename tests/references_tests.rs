//! End-to-end reference lookups over temporary repositories.
//!
//! Each test writes a small JavaScript/TypeScript project and checks the
//! files reported for a position.

#[cfg(test)]
mod tests {
    use reference_getter::{run_lookup, LookupOptions, RefError};
    use std::fs;
    use tempfile::TempDir;

    fn repo(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp repo");
        for (rel, text) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, text).unwrap();
        }
        dir
    }

    fn lookup_in_order(dir: &TempDir, location: &str) -> Vec<String> {
        run_lookup(dir.path(), location, &LookupOptions::default())
            .expect("lookup succeeds")
            .into_vec()
    }

    /// Referencing files, sorted; set order carries no meaning.
    fn lookup(dir: &TempDir, location: &str) -> Vec<String> {
        let mut files = lookup_in_order(dir, location);
        files.sort();
        files
    }

    #[test]
    fn test_function_used_in_several_files() {
        let dir = repo(&[
            ("src/math.ts", "export function add(a: number, b: number) {\n  return a + b;\n}\n"),
            ("src/app.ts", "import { add } from './math';\nadd(1, 2);\n"),
            ("src/report.ts", "import { add } from './math';\nexport const total = add(3, 4);\n"),
            ("src/unrelated.ts", "export function add() { return 0; }\n"),
        ]);
        assert_eq!(
            lookup(&dir, "src/math.ts:1:17"),
            vec!["src/app.ts", "src/math.ts", "src/report.ts"]
        );
    }

    #[test]
    fn test_lookup_from_usage_site() {
        let dir = repo(&[
            ("lib/user.ts", "export interface User { name: string }\n"),
            ("lib/api.ts", "import { User } from './user';\nexport function load(): User { return { name: '' }; }\n"),
            ("main.ts", "import type { User } from './lib/user';\nlet u: User;\n"),
        ]);
        assert_eq!(
            lookup(&dir, "main.ts:2:8"),
            vec!["lib/api.ts", "lib/user.ts", "main.ts"]
        );
    }

    #[test]
    fn test_parameter_references_stay_local() {
        let dir = repo(&[
            ("a.ts", "export function greet(name: string) {\n  return name;\n}\n"),
            ("b.ts", "const name = 'x';\nexport default name;\n"),
        ]);
        assert_eq!(lookup(&dir, "a.ts:1:23"), vec!["a.ts"]);
    }

    #[test]
    fn test_default_export_and_rename() {
        let dir = repo(&[
            ("Button.tsx", "export default function Button() { return <button />; }\n"),
            ("App.tsx", "import Btn from './Button';\nexport const App = () => <Btn />;\n"),
            ("Other.tsx", "export default function Button() { return null; }\n"),
        ]);
        assert_eq!(lookup(&dir, "Button.tsx:1:25"), vec!["App.tsx", "Button.tsx"]);
    }

    #[test]
    fn test_barrel_reexports() {
        let dir = repo(&[
            ("src/models/user.ts", "export class User {}\n"),
            ("src/models/index.ts", "export * from './user';\n"),
            ("src/index.ts", "export { User as Account } from './models';\n"),
            ("src/main.ts", "import { Account } from './index';\nnew Account();\n"),
        ]);
        assert_eq!(
            lookup(&dir, "src/models/user.ts:1:14"),
            vec!["src/index.ts", "src/main.ts", "src/models/user.ts"]
        );
    }

    #[test]
    fn test_commonjs_project() {
        let dir = repo(&[
            ("lib/format.js", "function format(s) { return s.trim(); }\nmodule.exports = { format };\n"),
            ("index.js", "const { format } = require('./lib/format');\nformat(' x ');\n"),
            ("cli.js", "const fmt = require('./lib/format.js');\nfmt.format('y');\n"),
        ]);
        assert_eq!(
            lookup(&dir, "lib/format.js:1:10"),
            vec!["cli.js", "index.js", "lib/format.js"]
        );
    }

    #[test]
    fn test_ts_imports_from_js_with_js_extension() {
        let dir = repo(&[
            ("util.ts", "export const VERSION = '1';\n"),
            ("main.ts", "import { VERSION } from './util.js';\nconsole.log(VERSION);\n"),
        ]);
        assert_eq!(lookup(&dir, "main.ts:2:13"), vec!["main.ts", "util.ts"]);
    }

    #[test]
    fn test_class_methods_through_this() {
        let dir = repo(&[(
            "counter.ts",
            "export class Counter {\n  private n = 0;\n  inc() { this.n++; return this; }\n}\n",
        )]);
        assert_eq!(lookup(&dir, "counter.ts:3:16"), vec!["counter.ts"]);
    }

    #[test]
    fn test_namespace_import_members() {
        let dir = repo(&[
            ("constants.ts", "export const LIMIT = 10;\nexport const OTHER = 1;\n"),
            ("use.ts", "import * as C from './constants';\nC.LIMIT;\n"),
            ("other.ts", "import * as C from './constants';\nC.OTHER;\n"),
        ]);
        assert_eq!(
            lookup(&dir, "constants.ts:1:14"),
            vec!["constants.ts", "use.ts"]
        );
    }

    #[test]
    fn test_script_globals_across_files() {
        let dir = repo(&[
            ("globals.js", "var APP_NAME = 'demo';\n"),
            ("page.js", "document.title = APP_NAME;\n"),
            ("module.js", "const APP_NAME = 'x';\nexport { APP_NAME };\n"),
        ]);
        assert_eq!(lookup(&dir, "globals.js:1:5"), vec!["globals.js", "page.js"]);
    }

    #[test]
    fn test_syntax_errors_do_not_hide_files() {
        let dir = repo(&[
            ("a.ts", "export const good = 1;\n"),
            ("broken.ts", "import { good } from './a';\ngood;\nconst broken = ;\n"),
        ]);
        assert_eq!(lookup(&dir, "a.ts:1:14"), vec!["a.ts", "broken.ts"]);
    }

    #[test]
    fn test_invalid_utf8_file_is_skipped() {
        let dir = repo(&[("a.ts", "export const v = 1;\n")]);
        fs::write(dir.path().join("bad.ts"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        assert_eq!(lookup(&dir, "a.ts:1:14"), vec!["a.ts"]);

        let err = run_lookup(dir.path(), "bad.ts:1:1", &LookupOptions::default()).unwrap_err();
        assert!(matches!(err, RefError::FileNotInProgram(_)));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let dir = repo(&[
            ("z.ts", "import { k } from './a';\nk;\n"),
            ("a.ts", "export const k = 1;\n"),
            ("m/n.ts", "import { k } from '../a';\nk;\n"),
        ]);
        let first = lookup_in_order(&dir, "a.ts:1:14");
        let second = lookup_in_order(&dir, "a.ts:1:14");
        assert_eq!(first, second);
        assert_eq!(lookup(&dir, "a.ts:1:14"), vec!["a.ts", "m/n.ts", "z.ts"]);
    }

    #[test]
    fn test_output_follows_discovery_order() {
        let dir = repo(&[
            ("util.js", "function slug(s) { return s; }\nexports.slug = slug;\n"),
            ("a.js", "const { slug } = require('./util');\nslug('a');\n"),
            ("b.js", "const util = require('./util.js');\nutil.slug('b');\n"),
        ]);
        assert_eq!(
            lookup_in_order(&dir, "util.js:1:10"),
            vec!["a.js", "b.js", "util.js"]
        );
    }

    #[test]
    fn test_utf16_columns() {
        let dir = repo(&[
            ("a.ts", "const s = '😀'; export const target = s;\n"),
            ("b.ts", "import { target } from './a';\ntarget;\n"),
        ]);
        // the emoji is two UTF-16 units, so `target` starts at column 30
        assert_eq!(lookup(&dir, "a.ts:1:30"), vec!["a.ts", "b.ts"]);
    }
}
