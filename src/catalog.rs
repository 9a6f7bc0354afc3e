//! Static catalog of downloadable archives
//!
//! Entries are immutable. The toolchain archive depends on the host; the
//! Android package table lists auxiliary prebuilt SDKs fetched once per cache
//! location.

use crate::cache::location::HostPlatform;
use crate::hash::HashAlgorithm;

/// Default bucket for Android prebuilt packages
const ANDROID_BASE_URL: &str = "https://hifi-public.s3.amazonaws.com/dependencies/android/";

/// Android package holding the GUI toolkit SDK
pub const SDK_PACKAGE: &str = "qt";

/// Archive container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    /// Infer the format from an archive file name
    pub fn from_file_name(file: &str) -> Self {
        if file.ends_with(".zip") {
            Self::Zip
        } else {
            Self::TarGz
        }
    }
}

/// A downloadable, checksum-verified archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Package name, also its directory name under the cache
    pub name: String,
    /// Archive file name
    pub file: String,
    /// URL prefix the file name is appended to
    pub base_url: String,
    /// Object version pinned in the query string
    pub version_id: Option<String>,
    /// Expected hex digest of the archive
    pub checksum: String,
    /// Algorithm producing `checksum`
    pub hash_algorithm: HashAlgorithm,
    /// Archive container format
    pub archive_kind: ArchiveKind,
    /// Folder inside the extracted package holding shared libraries to bundle
    pub shared_lib_subfolder: Option<String>,
    /// Libraries to copy from `shared_lib_subfolder` (all when empty)
    pub include_libs: Vec<String>,
}

impl PackageSpec {
    fn android(name: &str, file: &str, version_id: Option<&str>, checksum: &str) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
            base_url: ANDROID_BASE_URL.to_string(),
            version_id: version_id.map(str::to_string),
            checksum: checksum.to_string(),
            hash_algorithm: HashAlgorithm::Md5,
            archive_kind: ArchiveKind::from_file_name(file),
            shared_lib_subfolder: None,
            include_libs: Vec::new(),
        }
    }

    fn with_shared_libs(mut self, folder: &str, libs: &[&str]) -> Self {
        self.shared_lib_subfolder = Some(folder.to_string());
        self.include_libs = libs.iter().map(|l| l.to_string()).collect();
        self
    }

    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Full download URL
    pub fn url(&self) -> String {
        match &self.version_id {
            Some(version) => format!("{}{}?versionId={}", self.base_url, self.file, version),
            None => format!("{}{}", self.base_url, self.file),
        }
    }
}

/// Every archive a run may download, resolved for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Package-manager toolchain
    pub toolchain: PackageSpec,
    /// Prebuilt `installed/arm64-android` tree
    pub android_installed: PackageSpec,
    /// Auxiliary Android SDKs
    pub android_packages: Vec<PackageSpec>,
}

impl Catalog {
    pub fn for_host(host: HostPlatform) -> Self {
        Self {
            toolchain: toolchain_archive(host),
            android_installed: android_installed_archive(),
            android_packages: android_packages(host),
        }
    }
}

/// Package-manager toolchain archive for a host
pub fn toolchain_archive(host: HostPlatform) -> PackageSpec {
    let (file, version, checksum) = match host {
        HostPlatform::Windows => (
            "vcpkg-win32.tar.gz",
            "YZYkDejDRk7L_hrK_WVFthWvisAhbDzZ",
            "3e0ff829a74956491d57666109b3e6b5ce4ed0735c24093884317102387b2cb1b2cd1ff38af9ed9173501f6e32ffa05cc6fe6d470b77a71ca1ffc3e0aa46ab9e",
        ),
        HostPlatform::MacOS => (
            "vcpkg-osx.tar.gz",
            "_fhqSxjfrtDJBvEsQ8L_ODcdUjlpX9cc",
            "519d666d02ef22b87c793f016ca412e70f92e1d55953c8f9bd4ee40f6d9f78c1df01a6ee293907718f3bbf24075cc35492fb216326dfc50712a95858e9cbcb4d",
        ),
        HostPlatform::Linux => (
            "vcpkg-linux.tar.gz",
            "97Nazh24etEVKWz33XwgLY0bvxEfZgMU",
            "6a1ce47ef6621e699a4627e8821ad32528c82fce62a6939d35b205da2d299aaa405b5f392df4a9e5343dd6a296516e341105fbb2dd8b48864781d129d7fba10d",
        ),
    };
    PackageSpec {
        name: "vcpkg".to_string(),
        file: file.to_string(),
        base_url: "https://hifi-public.s3.amazonaws.com/dependencies/vcpkg/".to_string(),
        version_id: Some(version.to_string()),
        checksum: checksum.to_string(),
        hash_algorithm: HashAlgorithm::Sha512,
        archive_kind: ArchiveKind::TarGz,
        shared_lib_subfolder: None,
        include_libs: Vec::new(),
    }
}

/// Prebuilt `installed/arm64-android` tree
pub fn android_installed_archive() -> PackageSpec {
    PackageSpec {
        name: "arm64-android".to_string(),
        file: "vcpkg-arm64-android.tar.gz".to_string(),
        base_url: "https://hifi-public.s3.amazonaws.com/dependencies/vcpkg/".to_string(),
        version_id: None,
        checksum: "832f82a4d090046bdec25d313e20f56ead45b54dd06eee3798c5c8cbdd64cce4067692b1c3f26a89afe6ff9917c10e4b601c118bea06d23f8adbfe5c0ec12bc3".to_string(),
        hash_algorithm: HashAlgorithm::Sha512,
        archive_kind: ArchiveKind::TarGz,
        shared_lib_subfolder: None,
        include_libs: Vec::new(),
    }
}

fn android_qt(host: HostPlatform) -> PackageSpec {
    let (file, version, checksum) = match host {
        HostPlatform::Windows => (
            "qt-5.11.1_win_armv8-libcpp_openssl_patched.tgz",
            "JfWM0P_Mz5Qp0LwpzhrsRwN3fqlLSFeT",
            "0582191cc55431aa4f660848a542883e",
        ),
        HostPlatform::MacOS => (
            "qt-5.11.1_osx_armv8-libcpp_openssl_patched.tgz",
            "OxBD7iKINv1HbyOXmAmDrBb8AF3N.Kup",
            "c83cc477c08a892e00c71764dca051a0",
        ),
        HostPlatform::Linux => (
            "qt-5.11.1_linux_armv8-libcpp_openssl_patched.tgz",
            "3S97HBM5G5Xw9EfE52sikmgdN3t6C2MN",
            "aa449d4bfa963f3bc9a9dfe558ba29df",
        ),
    };
    PackageSpec::android(SDK_PACKAGE, file, Some(version), checksum)
}

/// Auxiliary Android packages, in fetch order
pub fn android_packages(host: HostPlatform) -> Vec<PackageSpec> {
    vec![
        android_qt(host),
        PackageSpec::android(
            "bullet",
            "bullet-2.88_armv8-libcpp.tgz",
            Some("S8YaoED0Cl8sSb8fSV7Q2G1lQJSNDxqg"),
            "81642779ccb110f8c7338e8739ac38a0",
        ),
        PackageSpec::android(
            "draco",
            "draco_armv8-libcpp.tgz",
            Some("3.B.uBj31kWlgND3_R2xwQzT_TP6Dz_8"),
            "617a80d213a5ec69fbfa21a1f2f738cd",
        ),
        PackageSpec::android(
            "glad",
            "glad_armv8-libcpp.zip",
            Some("r5Zran.JSCtvrrB6Q4KaqfIoALPw3lYY"),
            "a8ee8584cf1ccd34766c7ddd9d5e5449",
        ),
        PackageSpec::android(
            "gvr",
            "gvrsdk_v1.101.0.tgz",
            Some("nqBV_j81Uc31rC7bKIrlya_Hah4v3y5r"),
            "57fd02baa069176ba18597a29b6b4fc7",
        ),
        PackageSpec::android(
            "nvtt",
            "nvtt_armv8-libcpp.zip",
            Some("lmkBVR5t4UF1UUwMwEirnk9H_8Nt90IO"),
            "eb46d0b683e66987190ed124aabf8910",
        )
        .with_shared_libs(
            "lib",
            &["libnvtt.so", "libnvmath.so", "libnvimage.so", "libnvcore.so"],
        ),
        PackageSpec::android(
            "oculus",
            "ovr_sdk_mobile_1.19.0.zip",
            Some("s_RN1vlEvUi3pnT7WPxUC4pQ0RJBs27y"),
            "98f0afb62861f1f02dd8110b31ed30eb",
        )
        .with_shared_libs("VrApi/Libs/Android/arm64-v8a/Release", &["libvrapi.so"]),
        PackageSpec::android(
            "openssl",
            "openssl-1.1.0g_armv8.tgz",
            Some("AiiPjmgUZTgNj7YV1EEx2lL47aDvvvAW"),
            "cabb681fbccd79594f65fcc266e02f32",
        ),
        PackageSpec::android(
            "polyvox",
            "polyvox_armv8-libcpp.tgz",
            Some("A2kbKiNhpIenGq23bKRRzg7IMAI5BI92"),
            "dba88b3a098747af4bb169e9eb9af57e",
        )
        .with_shared_libs("lib", &["Release/libPolyVoxCore.so", "libPolyVoxUtil.so"]),
        PackageSpec::android(
            "tbb",
            "tbb-2018_U1_armv8_libcpp.tgz",
            Some("mrRbWnv4O4evcM1quRH43RJqimlRtaKB"),
            "20768f298f53b195e71b414b0ae240c4",
        )
        .with_shared_libs("lib/release", &["libtbb.so", "libtbbmalloc.so"]),
        PackageSpec::android(
            "hifiAC",
            "codecSDK-android_armv8-2.0.zip",
            None,
            "1cbef929675818fc64c4101b72f84a6a",
        )
        .with_base_url("http://s3.amazonaws.com/hifi-public/dependencies/"),
        PackageSpec::android(
            "etc2comp",
            "etc2comp-patched-armv8-libcpp.tgz",
            Some("bHhGECRAQR1vkpshBcK6ByNc1BQIM8gU"),
            "14b02795d774457a33bbc60e00a786bc",
        ),
        PackageSpec::android(
            "breakpad",
            "breakpad.tgz",
            Some("8VrYXz7oyc.QBxNia0BVJOUBvrFO61jI"),
            "ddcb23df336b08017042ba4786db1d9e",
        )
        .with_shared_libs("lib", &["libbreakpad_client.a"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn archive_kind_from_extension() {
        assert_eq!(ArchiveKind::from_file_name("glad_armv8-libcpp.zip"), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_file_name("breakpad.tgz"), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::from_file_name("vcpkg-linux.tar.gz"), ArchiveKind::TarGz);
    }

    #[test]
    fn url_with_version_id() {
        let spec = toolchain_archive(HostPlatform::Linux);
        assert_eq!(
            spec.url(),
            "https://hifi-public.s3.amazonaws.com/dependencies/vcpkg/vcpkg-linux.tar.gz?versionId=97Nazh24etEVKWz33XwgLY0bvxEfZgMU"
        );
        assert_eq!(spec.hash_algorithm, HashAlgorithm::Sha512);
    }

    #[test]
    fn url_without_version_id_uses_custom_base() {
        let packages = android_packages(HostPlatform::Linux);
        let codec = packages.iter().find(|p| p.name == "hifiAC").unwrap();
        assert_eq!(
            codec.url(),
            "http://s3.amazonaws.com/hifi-public/dependencies/codecSDK-android_armv8-2.0.zip"
        );
        assert_eq!(codec.archive_kind, ArchiveKind::Zip);
    }

    #[test]
    fn qt_package_varies_by_host() {
        let linux = android_qt(HostPlatform::Linux);
        let mac = android_qt(HostPlatform::MacOS);
        assert_ne!(linux.file, mac.file);
        assert_eq!(linux.name, "qt");
        assert_eq!(mac.name, "qt");
    }

    #[test]
    fn package_names_are_unique() {
        let packages = android_packages(HostPlatform::Windows);
        let names: HashSet<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), packages.len());
        assert!(packages.iter().all(|p| p.hash_algorithm == HashAlgorithm::Md5));
    }

    #[test]
    fn catalog_for_host() {
        let catalog = Catalog::for_host(HostPlatform::Windows);
        assert_eq!(catalog.toolchain.file, "vcpkg-win32.tar.gz");
        assert_eq!(catalog.android_installed.name, "arm64-android");
        assert_eq!(catalog.android_packages.len(), 13);
        assert!(catalog.android_packages[0].file.contains("_win_"));
    }

    #[test]
    fn shared_lib_entries() {
        let packages = android_packages(HostPlatform::Linux);
        let tbb = packages.iter().find(|p| p.name == "tbb").unwrap();
        assert_eq!(tbb.shared_lib_subfolder.as_deref(), Some("lib/release"));
        assert_eq!(tbb.include_libs, vec!["libtbb.so", "libtbbmalloc.so"]);
    }
}
