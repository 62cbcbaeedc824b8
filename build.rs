fn main() {
    #[cfg(target_os = "windows")]
    {
        let mut res = winres::WindowsResource::new();
        res.set_icon("assets/logo.ico");
        res.set("ProductName", "Teleview");
        res.set("FileDescription", "Climate teleconnection index dashboard");
        res.compile().expect("Failed to compile Windows resources");
    }
}
