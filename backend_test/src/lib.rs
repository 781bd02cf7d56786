use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one, inject dependencies,
/// and ensure that any test database is dropped regardless of how the test
/// terminates.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::storage::Storage`; the client serves requests from the same storage.
///
/// Tests run on in-memory storage by default. `#[backend_test(mongodb)]` runs on
/// a fresh MongoDB database at `TEST_DB_URI` instead, and is skipped if that
/// variable is unset.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
    let (test_args, has_client, has_storage) = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Pick the storage backend.
    let storage_setup = match parse_macro_input!(args as Option<Ident>) {
        None => quote! {
            Some((crate::storage::Storage::in_memory(), None::<mongodb::Database>))
        },
        Some(arg) if arg == "mongodb" => quote! {
            match crate::test_database().await {
                Some(db) => {
                    let storage = crate::storage::Storage::mongodb(&db).await.unwrap();
                    Some((storage, Some(db)))
                }
                None => None,
            }
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected no argument or `mongodb`")
                .into_compile_error()
                .into();
        }
    };

    let client_setup = if has_client {
        quote! {
            let rocket_client = outer_runtime
                .block_on(rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_storage(storage.clone()),
                ))
                .unwrap();
            let client_mutex = std::sync::Mutex::new(rocket_client);
        }
    } else {
        quote! {}
    };
    let client_take = if has_client {
        quote! { let rocket_client = client_mutex.into_inner().unwrap(); }
    } else {
        quote! {}
    };
    let (storage_keep, storage_take) = if has_storage {
        (
            quote! { let storage_mutex = std::sync::Mutex::new(storage); },
            quote! { let storage = storage_mutex.into_inner().unwrap(); },
        )
    } else {
        (quote! { drop(storage); }, quote! {})
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// The test itself.
            #item_fn

            log4rs_test_utils::test_logging::init_logging_once_for(
                vec!["voting_backend"],
                None,
                None,
            );

            // Create an async runtime. We need a separate one for inside and
            // outside the `catch_unwind`.
            let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-setup-cleanup")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            // Run the setup.
            let setup: Option<(crate::storage::Storage, Option<mongodb::Database>)> =
                outer_runtime.block_on(async { #storage_setup });
            let (storage, db) = match setup {
                Some(setup) => setup,
                None => {
                    eprintln!("Skipping {}: TEST_DB_URI is not set", stringify!(#name));
                    return;
                }
            };
            #client_setup
            #storage_keep

            // Run the test, catching any panics.
            // Use mutexes to safely transfer `!UnwindSafe` data.
            let runtime_mutex = std::sync::Mutex::new(inner_runtime);
            let result = std::panic::catch_unwind(|| {
                let runtime = runtime_mutex.into_inner().unwrap();
                #client_take
                #storage_take
                runtime.block_on(#new_name(#(#test_args),*));
            });

            // Run the cleanup.
            if let Some(db) = db {
                outer_runtime.block_on(async { db.drop(None).await.unwrap() });
            }

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::resume_unwind(cause);
            }
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<(Vec<TokenStream2>, bool, bool), syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_storage = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                if let Some(type_ident) = type_path.path.get_ident() {
                    if type_ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident == "Storage" {
                        if has_storage {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `Storage`",
                            ));
                        }
                        has_storage = true;
                        args.push(quote! { storage });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `storage_ident: Storage`",
        ));
    }

    Ok((args, has_client, has_storage))
}
